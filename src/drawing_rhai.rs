//! Rhai registration for the drawing-mode capability surface.
//!
//! Shapes are configured through methods; particles expose their fields as
//! read/write properties so scripts can drive them directly.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, FLOAT};

use crate::drawing::DrawingSimulation;
use crate::entity::Handle;
use crate::game_rhai::{to_f32, to_vec2};
use crate::particle::Particle;
use crate::shapes::{Circle, Rectangle, Shape, Triangle};
use crate::simulation::spawn;

type Sim = Rc<RefCell<DrawingSimulation>>;

/// Register shape and particle constructors bound to `sim`.
pub fn register_drawing_api(engine: &mut Engine, sim: Sim) {
    register_circle(engine, &sim);
    register_rectangle(engine, &sim);
    register_triangle(engine, &sim);
    register_shape_methods::<Circle>(engine);
    register_shape_methods::<Rectangle>(engine);
    register_shape_methods::<Triangle>(engine);
    register_particle(engine, &sim);
}

fn register_circle(engine: &mut Engine, sim: &Sim) {
    engine.register_type_with_name::<Handle<Circle>>("Circle");

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Circle",
        move |x: Dynamic, y: Dynamic, r: Dynamic| -> Result<Handle<Circle>, Box<EvalAltResult>> {
            let circle = Circle::new(to_vec2(&x, &y)?, to_f32(&r, "radius")?, Circle::DEFAULT_COLOR);
            Ok(spawn(&registry, circle))
        },
    );

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Circle",
        move |x: Dynamic,
              y: Dynamic,
              r: Dynamic,
              color: ImmutableString|
              -> Result<Handle<Circle>, Box<EvalAltResult>> {
            let circle = Circle::new(to_vec2(&x, &y)?, to_f32(&r, "radius")?, color.as_str());
            Ok(spawn(&registry, circle))
        },
    );

    engine.register_get("radius", |c: &mut Handle<Circle>| -> FLOAT { c.borrow().radius });
}

fn register_rectangle(engine: &mut Engine, sim: &Sim) {
    engine.register_type_with_name::<Handle<Rectangle>>("Rectangle");

    fn build(
        x: &Dynamic,
        y: &Dynamic,
        w: &Dynamic,
        h: &Dynamic,
        color: &str,
    ) -> Result<Rectangle, Box<EvalAltResult>> {
        let size = Vec2::new(to_f32(w, "width")?, to_f32(h, "height")?);
        Ok(Rectangle::new(to_vec2(x, y)?, size, color))
    }

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Rectangle",
        move |x: Dynamic,
              y: Dynamic,
              w: Dynamic,
              h: Dynamic|
              -> Result<Handle<Rectangle>, Box<EvalAltResult>> {
            Ok(spawn(&registry, build(&x, &y, &w, &h, Rectangle::DEFAULT_COLOR)?))
        },
    );

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Rectangle",
        move |x: Dynamic,
              y: Dynamic,
              w: Dynamic,
              h: Dynamic,
              color: ImmutableString|
              -> Result<Handle<Rectangle>, Box<EvalAltResult>> {
            Ok(spawn(&registry, build(&x, &y, &w, &h, color.as_str())?))
        },
    );

    engine.register_get("width", |r: &mut Handle<Rectangle>| -> FLOAT { r.borrow().size.x });
    engine.register_get("height", |r: &mut Handle<Rectangle>| -> FLOAT { r.borrow().size.y });
}

fn register_triangle(engine: &mut Engine, sim: &Sim) {
    engine.register_type_with_name::<Handle<Triangle>>("Triangle");

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Triangle",
        move |x: Dynamic, y: Dynamic, s: Dynamic| -> Result<Handle<Triangle>, Box<EvalAltResult>> {
            let tri = Triangle::new(to_vec2(&x, &y)?, to_f32(&s, "size")?, Triangle::DEFAULT_COLOR);
            Ok(spawn(&registry, tri))
        },
    );

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Triangle",
        move |x: Dynamic,
              y: Dynamic,
              s: Dynamic,
              color: ImmutableString|
              -> Result<Handle<Triangle>, Box<EvalAltResult>> {
            let tri = Triangle::new(to_vec2(&x, &y)?, to_f32(&s, "size")?, color.as_str());
            Ok(spawn(&registry, tri))
        },
    );
}

/// Methods and getters common to every shape kind.
fn register_shape_methods<T: Shape + std::fmt::Display + 'static>(engine: &mut Engine) {
    engine.register_fn(
        "setVelocity",
        |s: &mut Handle<T>, vx: Dynamic, vy: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let velocity = Vec2::new(to_f32(&vx, "vx")?, to_f32(&vy, "vy")?);
            s.borrow_mut().set_velocity(velocity);
            Ok(())
        },
    );
    engine.register_fn("setColor", |s: &mut Handle<T>, color: ImmutableString| {
        s.borrow_mut().set_color(color.to_string());
    });
    engine.register_fn(
        "setRotationSpeed",
        |s: &mut Handle<T>, speed: Dynamic| -> Result<(), Box<EvalAltResult>> {
            s.borrow_mut().set_rotation_speed(to_f32(&speed, "speed")?);
            Ok(())
        },
    );

    engine.register_get("x", |s: &mut Handle<T>| -> FLOAT { s.borrow().motion().position.x });
    engine.register_get("y", |s: &mut Handle<T>| -> FLOAT { s.borrow().motion().position.y });
    engine.register_get("rotation", |s: &mut Handle<T>| -> FLOAT { s.borrow().motion().rotation });

    engine.register_fn("to_string", |s: &mut Handle<T>| s.to_string());
    engine.register_fn("to_debug", |s: &mut Handle<T>| s.to_string());
}

fn register_particle(engine: &mut Engine, sim: &Sim) {
    engine.register_type_with_name::<Handle<Particle>>("Particle");

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Particle",
        move |x: Dynamic, y: Dynamic| -> Result<Handle<Particle>, Box<EvalAltResult>> {
            let position = to_vec2(&x, &y)?;
            let particle = registry
                .borrow_mut()
                .spawn_particle(position, Particle::DEFAULT_COLOR.to_string());
            Ok(spawn(&registry, particle))
        },
    );

    let registry = Rc::clone(sim);
    engine.register_fn(
        "Particle",
        move |x: Dynamic, y: Dynamic, color: ImmutableString| -> Result<Handle<Particle>, Box<EvalAltResult>> {
            let position = to_vec2(&x, &y)?;
            let particle = registry.borrow_mut().spawn_particle(position, color.to_string());
            Ok(spawn(&registry, particle))
        },
    );

    engine.register_fn(
        "setGravity",
        |p: &mut Handle<Particle>, gravity: Dynamic| -> Result<(), Box<EvalAltResult>> {
            p.borrow_mut().set_gravity(to_f32(&gravity, "gravity")?);
            Ok(())
        },
    );

    register_particle_field(engine, "x", |p| &mut p.position.x);
    register_particle_field(engine, "y", |p| &mut p.position.y);
    register_particle_field(engine, "vx", |p| &mut p.velocity.x);
    register_particle_field(engine, "vy", |p| &mut p.velocity.y);
    register_particle_field(engine, "life", |p| &mut p.life);
    register_particle_field(engine, "decay", |p| &mut p.decay);
    register_particle_field(engine, "size", |p| &mut p.size);
    register_particle_field(engine, "gravity", |p| &mut p.gravity);

    engine.register_get("color", |p: &mut Handle<Particle>| -> ImmutableString {
        p.borrow().color.as_str().into()
    });
    engine.register_set("color", |p: &mut Handle<Particle>, color: ImmutableString| {
        p.borrow_mut().color = color.to_string();
    });

    engine.register_fn("isDead", |p: &mut Handle<Particle>| p.borrow().is_dead());
    engine.register_fn("to_string", |p: &mut Handle<Particle>| p.to_string());
    engine.register_fn("to_debug", |p: &mut Handle<Particle>| p.to_string());
}

/// A numeric particle property; the setter accepts integers or floats.
fn register_particle_field(
    engine: &mut Engine,
    name: &'static str,
    field: fn(&mut Particle) -> &mut f32,
) {
    engine.register_get(name, move |p: &mut Handle<Particle>| -> FLOAT {
        *field(&mut p.borrow_mut())
    });
    engine.register_set(
        name,
        move |p: &mut Handle<Particle>, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            *field(&mut p.borrow_mut()) = to_f32(&value, name)?;
            Ok(())
        },
    );
}
