//! Rhai registration for the game-mode capability surface.
//!
//! Scripts see `Snake` and `BouncingBall` constructors. Each constructor
//! builds the entity, registers it into the simulation it was bound to, and
//! returns the shared handle so further method calls reach the simulated
//! instance.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rhai::{Dynamic, Engine, EvalAltResult, ImmutableString, FLOAT};

use crate::bouncing_ball::BouncingBall;
use crate::entity::Handle;
use crate::simulation::{spawn, Simulation};
use crate::snake::{Direction, Snake};

const DEFAULT_SNAKE_POSITION: Vec2 = Vec2::new(200.0, 200.0);
const DEFAULT_BALL_POSITION: Vec2 = Vec2::new(200.0, 100.0);
const DEFAULT_BALL_RADIUS: f32 = 15.0;

/// Convert a numeric script argument to `f32`.
///
/// Accepts Rhai integers and floats; anything else is a script error naming
/// the offending parameter.
pub(crate) fn to_f32(value: &Dynamic, param: &str) -> Result<f32, Box<EvalAltResult>> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("Expected number for '{}', got {}", param, value.type_name()).into())
}

pub(crate) fn to_vec2(x: &Dynamic, y: &Dynamic) -> Result<Vec2, Box<EvalAltResult>> {
    Ok(Vec2::new(to_f32(x, "x")?, to_f32(y, "y")?))
}

/// Register the snake and ball constructors bound to `sim`.
pub fn register_game_api(engine: &mut Engine, sim: Rc<RefCell<Simulation>>) {
    register_snake(engine, Rc::clone(&sim));
    register_ball(engine, sim);
}

fn register_snake(engine: &mut Engine, sim: Rc<RefCell<Simulation>>) {
    engine.register_type_with_name::<Handle<Snake>>("Snake");

    let registry = Rc::clone(&sim);
    engine.register_fn("Snake", move || spawn(&registry, Snake::new(DEFAULT_SNAKE_POSITION)));

    let registry = sim;
    engine.register_fn(
        "Snake",
        move |x: Dynamic, y: Dynamic| -> Result<Handle<Snake>, Box<EvalAltResult>> {
            Ok(spawn(&registry, Snake::new(to_vec2(&x, &y)?)))
        },
    );

    engine.register_fn("setColor", |s: &mut Handle<Snake>, color: ImmutableString| {
        s.borrow_mut().set_color(color.as_str());
    });
    engine.register_fn(
        "setSpeed",
        |s: &mut Handle<Snake>, speed: Dynamic| -> Result<(), Box<EvalAltResult>> {
            s.borrow_mut().set_speed(to_f32(&speed, "speed")?);
            Ok(())
        },
    );
    engine.register_fn("move", |s: &mut Handle<Snake>, direction: ImmutableString| {
        match direction.parse::<Direction>() {
            Ok(direction) => s.borrow_mut().turn(direction),
            Err(e) => log::debug!("Snake.move ignored: {}", e),
        }
    });

    engine.register_get("x", |s: &mut Handle<Snake>| -> FLOAT { s.borrow().position.x });
    engine.register_get("y", |s: &mut Handle<Snake>| -> FLOAT { s.borrow().position.y });
    engine.register_get("speed", |s: &mut Handle<Snake>| -> FLOAT { s.borrow().speed() });

    engine.register_fn("to_string", |s: &mut Handle<Snake>| s.to_string());
    engine.register_fn("to_debug", |s: &mut Handle<Snake>| s.to_string());
}

fn register_ball(engine: &mut Engine, sim: Rc<RefCell<Simulation>>) {
    engine.register_type_with_name::<Handle<BouncingBall>>("BouncingBall");

    let registry = Rc::clone(&sim);
    engine.register_fn("BouncingBall", move || {
        spawn(&registry, BouncingBall::new(DEFAULT_BALL_POSITION, DEFAULT_BALL_RADIUS))
    });

    let registry = Rc::clone(&sim);
    engine.register_fn(
        "BouncingBall",
        move |x: Dynamic, y: Dynamic| -> Result<Handle<BouncingBall>, Box<EvalAltResult>> {
            Ok(spawn(&registry, BouncingBall::new(to_vec2(&x, &y)?, DEFAULT_BALL_RADIUS)))
        },
    );

    let registry = sim;
    engine.register_fn(
        "BouncingBall",
        move |x: Dynamic,
              y: Dynamic,
              radius: Dynamic|
              -> Result<Handle<BouncingBall>, Box<EvalAltResult>> {
            let radius = to_f32(&radius, "radius")?;
            Ok(spawn(&registry, BouncingBall::new(to_vec2(&x, &y)?, radius)))
        },
    );

    engine.register_fn("setColor", |b: &mut Handle<BouncingBall>, color: ImmutableString| {
        b.borrow_mut().set_color(color.as_str());
    });
    engine.register_fn(
        "setVelocity",
        |b: &mut Handle<BouncingBall>, vx: Dynamic, vy: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let velocity = Vec2::new(to_f32(&vx, "vx")?, to_f32(&vy, "vy")?);
            b.borrow_mut().set_velocity(velocity);
            Ok(())
        },
    );
    engine.register_fn(
        "setGravity",
        |b: &mut Handle<BouncingBall>, gravity: Dynamic| -> Result<(), Box<EvalAltResult>> {
            b.borrow_mut().set_gravity(to_f32(&gravity, "gravity")?);
            Ok(())
        },
    );
    engine.register_fn(
        "setBounce",
        |b: &mut Handle<BouncingBall>, bounce: Dynamic| -> Result<(), Box<EvalAltResult>> {
            b.borrow_mut().set_bounce(to_f32(&bounce, "bounce")?);
            Ok(())
        },
    );

    engine.register_get("x", |b: &mut Handle<BouncingBall>| -> FLOAT { b.borrow().position.x });
    engine.register_get("y", |b: &mut Handle<BouncingBall>| -> FLOAT { b.borrow().position.y });
    engine.register_get("radius", |b: &mut Handle<BouncingBall>| -> FLOAT { b.borrow().radius });

    engine.register_fn("to_string", |b: &mut Handle<BouncingBall>| b.to_string());
    engine.register_fn("to_debug", |b: &mut Handle<BouncingBall>| b.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_sim() -> (Engine, Rc<RefCell<Simulation>>) {
        let sim = Rc::new(RefCell::new(Simulation::default()));
        let mut engine = Engine::new();
        register_game_api(&mut engine, Rc::clone(&sim));
        (engine, sim)
    }

    #[test]
    fn test_constructor_registers_same_instance() {
        let (engine, sim) = engine_with_sim();
        engine
            .run(r#"let s = Snake(200, 200); s.setSpeed(3); s.move("up");"#)
            .unwrap();

        let sim = sim.borrow();
        assert_eq!(sim.snakes().len(), 1);
        let snake = sim.snakes()[0].borrow();
        assert_eq!(snake.speed(), 3.0);
        assert_eq!(snake.direction(), Direction::Up);
    }

    #[test]
    fn test_default_constructors() {
        let (engine, sim) = engine_with_sim();
        engine.run("Snake(); BouncingBall(); BouncingBall(10, 20);").unwrap();

        let sim = sim.borrow();
        assert_eq!(sim.snakes()[0].borrow().position, DEFAULT_SNAKE_POSITION);
        assert_eq!(sim.balls()[0].borrow().position, DEFAULT_BALL_POSITION);
        assert_eq!(sim.balls()[1].borrow().radius, DEFAULT_BALL_RADIUS);
        assert_eq!(sim.balls()[1].borrow().position, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_mixed_int_and_float_arguments() {
        let (engine, sim) = engine_with_sim();
        engine
            .run("let b = BouncingBall(5.5, 200, 10); b.setVelocity(-5, 0.5); b.setBounce(2); b.setGravity(0.2);")
            .unwrap();

        let sim = sim.borrow();
        let ball = sim.balls()[0].borrow();
        assert_eq!(ball.position, Vec2::new(5.5, 200.0));
        assert_eq!(ball.velocity, Vec2::new(-5.0, 0.5));
        assert_eq!(ball.bounciness(), 1.0);
        assert_eq!(ball.gravity, 0.2);
    }

    #[test]
    fn test_non_numeric_argument_is_script_error() {
        let (engine, sim) = engine_with_sim();
        let err = engine.run(r#"let s = Snake(1, 1); s.setSpeed("fast");"#).unwrap_err();
        assert!(err.to_string().contains("speed"), "{err}");
        // The snake built before the failure stays registered.
        assert_eq!(sim.borrow().snakes().len(), 1);
    }

    #[test]
    fn test_unknown_direction_is_ignored() {
        let (engine, sim) = engine_with_sim();
        engine.run(r#"let s = Snake(1, 1); s.move("sideways");"#).unwrap();
        assert_eq!(sim.borrow().snakes()[0].borrow().direction(), Direction::Right);
    }

    #[test]
    fn test_getters_read_live_state() {
        let (engine, _sim) = engine_with_sim();
        let x: FLOAT = engine.eval("let s = Snake(12, 34); s.x").unwrap();
        assert_eq!(x, 12.0);
        let y: FLOAT = engine.eval("let b = BouncingBall(1, 2, 3); b.y").unwrap();
        assert_eq!(y, 2.0);
    }
}
