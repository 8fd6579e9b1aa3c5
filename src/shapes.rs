//! Persistent shapes of drawing mode.
//!
//! All three kinds share [`Motion`] (position, velocity, rotation) and differ
//! in how they test the canvas edges and how they draw themselves.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;

use crate::color::resolve_color;
use crate::entity::Handle;
use crate::surface::Surface;

/// The capability set every shape exposes to scripts and to the simulation.
pub trait Shape {
    fn kind(&self) -> &'static str;
    fn motion(&self) -> &Motion;
    fn motion_mut(&mut self) -> &mut Motion;

    /// Advance one tick inside a canvas of the given extents.
    fn update(&mut self, bounds: Vec2);
    fn draw(&self, surface: &mut dyn Surface);

    fn set_velocity(&mut self, velocity: Vec2) {
        self.motion_mut().velocity = velocity;
    }

    fn set_color(&mut self, color: String) {
        self.motion_mut().color = color;
    }

    fn set_rotation_speed(&mut self, speed: f32) {
        self.motion_mut().rotation_speed = speed;
    }
}

pub type SharedShape = Handle<dyn Shape>;

/// Erase a concrete shape handle; the result is the same instance.
pub fn share<T: Shape + 'static>(handle: &Handle<T>) -> SharedShape {
    let rc: Rc<RefCell<dyn Shape>> = handle.rc().clone();
    Handle::from_rc(rc)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: String,
    /// Radians.
    pub rotation: f32,
    /// Radians per tick.
    pub rotation_speed: f32,
}

impl Motion {
    fn new(position: Vec2, color: String) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            color,
            rotation: 0.0,
            rotation_speed: 0.0,
        }
    }

    fn integrate(&mut self) {
        self.position += self.velocity;
        self.rotation += self.rotation_speed;
    }
}

fn rotated(points: &[Vec2], pivot: Vec2, angle: f32) -> Vec<Vec2> {
    let rot = Vec2::from_angle(angle);
    points.iter().map(|p| pivot + rot.rotate(*p)).collect()
}

#[derive(Debug, Clone)]
pub struct Circle {
    pub motion: Motion,
    pub radius: f32,
}

impl Circle {
    pub const DEFAULT_COLOR: &'static str = "#ff0000";

    pub fn new(position: Vec2, radius: f32, color: impl Into<String>) -> Self {
        Self {
            motion: Motion::new(position, color.into()),
            radius,
        }
    }
}

impl Shape for Circle {
    fn kind(&self) -> &'static str {
        "Circle"
    }

    fn motion(&self) -> &Motion {
        &self.motion
    }

    fn motion_mut(&mut self) -> &mut Motion {
        &mut self.motion
    }

    /// Bounces while overlapping an edge, wraps once fully beyond it.
    fn update(&mut self, bounds: Vec2) {
        self.motion.integrate();
        let r = self.radius;
        let m = &mut self.motion;

        if m.position.x - r < 0.0 || m.position.x + r > bounds.x {
            m.velocity.x = -m.velocity.x;
        }
        if m.position.y - r < 0.0 || m.position.y + r > bounds.y {
            m.velocity.y = -m.velocity.y;
        }

        if m.position.x < -r {
            m.position.x = bounds.x + r;
        }
        if m.position.x > bounds.x + r {
            m.position.x = -r;
        }
        if m.position.y < -r {
            m.position.y = bounds.y + r;
        }
        if m.position.y > bounds.y + r {
            m.position.y = -r;
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_circle(self.motion.position, self.radius, resolve_color(&self.motion.color));
    }
}

#[derive(Debug, Clone)]
pub struct Rectangle {
    pub motion: Motion,
    pub size: Vec2,
}

impl Rectangle {
    pub const DEFAULT_COLOR: &'static str = "#00ff00";

    /// `position` is the top-left corner.
    pub fn new(position: Vec2, size: Vec2, color: impl Into<String>) -> Self {
        Self {
            motion: Motion::new(position, color.into()),
            size,
        }
    }
}

impl Shape for Rectangle {
    fn kind(&self) -> &'static str {
        "Rectangle"
    }

    fn motion(&self) -> &Motion {
        &self.motion
    }

    fn motion_mut(&mut self) -> &mut Motion {
        &mut self.motion
    }

    fn update(&mut self, bounds: Vec2) {
        self.motion.integrate();
        let m = &mut self.motion;
        if m.position.x < 0.0 || m.position.x + self.size.x > bounds.x {
            m.velocity.x = -m.velocity.x;
        }
        if m.position.y < 0.0 || m.position.y + self.size.y > bounds.y {
            m.velocity.y = -m.velocity.y;
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let half = self.size / 2.0;
        let center = self.motion.position + half;
        let corners = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
        let points = rotated(&corners, center, self.motion.rotation);
        surface.fill_polygon(&points, resolve_color(&self.motion.color));
    }
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub motion: Motion,
    pub size: f32,
}

impl Triangle {
    pub const DEFAULT_COLOR: &'static str = "#0000ff";

    pub fn new(position: Vec2, size: f32, color: impl Into<String>) -> Self {
        Self {
            motion: Motion::new(position, color.into()),
            size,
        }
    }
}

impl Shape for Triangle {
    fn kind(&self) -> &'static str {
        "Triangle"
    }

    fn motion(&self) -> &Motion {
        &self.motion
    }

    fn motion_mut(&mut self) -> &mut Motion {
        &mut self.motion
    }

    fn update(&mut self, bounds: Vec2) {
        self.motion.integrate();
        let m = &mut self.motion;
        if m.position.x < 0.0 || m.position.x > bounds.x {
            m.velocity.x = -m.velocity.x;
        }
        if m.position.y < 0.0 || m.position.y > bounds.y {
            m.velocity.y = -m.velocity.y;
        }
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let s = self.size;
        let vertices = [Vec2::new(0.0, -s), Vec2::new(-s, s), Vec2::new(s, s)];
        let points = rotated(&vertices, self.motion.position, self.motion.rotation);
        surface.fill_polygon(&points, resolve_color(&self.motion.color));
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.motion.position;
        write!(f, "Circle({}, {}, r={})", p.x, p.y, self.radius)
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.motion.position;
        write!(f, "Rectangle({}, {}, {}x{})", p.x, p.y, self.size.x, self.size.y)
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.motion.position;
        write!(f, "Triangle({}, {}, size={})", p.x, p.y, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    const BOUNDS: Vec2 = Vec2::new(200.0, 100.0);

    #[test]
    fn test_integrates_position_and_rotation() {
        let mut rect = Rectangle::new(Vec2::new(50.0, 50.0), Vec2::new(10.0, 10.0), "#fff");
        rect.set_velocity(Vec2::new(2.0, -1.0));
        rect.set_rotation_speed(0.5);
        rect.update(BOUNDS);
        rect.update(BOUNDS);
        assert_eq!(rect.motion.position, Vec2::new(54.0, 48.0));
        assert_eq!(rect.motion.rotation, 1.0);
    }

    #[test]
    fn test_rectangle_bounces_on_far_edge() {
        let mut rect = Rectangle::new(Vec2::new(188.0, 10.0), Vec2::new(10.0, 10.0), "#fff");
        rect.set_velocity(Vec2::new(3.0, 0.0));
        rect.update(BOUNDS);
        assert_eq!(rect.motion.position.x, 191.0);
        assert_eq!(rect.motion.velocity.x, -3.0);
    }

    #[test]
    fn test_triangle_bounces_on_centre_crossing() {
        let mut tri = Triangle::new(Vec2::new(1.0, 50.0), 10.0, "#fff");
        tri.set_velocity(Vec2::new(-2.0, 0.0));
        tri.update(BOUNDS);
        assert_eq!(tri.motion.position.x, -1.0);
        assert_eq!(tri.motion.velocity.x, 2.0);
    }

    #[test]
    fn test_circle_bounces_while_overlapping() {
        let mut circle = Circle::new(Vec2::new(12.0, 50.0), 10.0, "#fff");
        circle.set_velocity(Vec2::new(-4.0, 0.0));
        circle.update(BOUNDS);
        assert_eq!(circle.motion.position.x, 8.0);
        assert_eq!(circle.motion.velocity.x, 4.0);
    }

    #[test]
    fn test_circle_wraps_once_fully_off_canvas() {
        let mut circle = Circle::new(Vec2::new(-9.0, 50.0), 10.0, "#fff");
        circle.set_velocity(Vec2::new(-2.0, 0.0));
        circle.update(BOUNDS);
        // Fully departed past -radius: teleport to the far side.
        assert_eq!(circle.motion.position.x, 210.0);
    }

    #[test]
    fn test_draw_uses_resolved_color() {
        let mut surface = RecordingSurface::new(200, 100);
        let log = surface.log();
        let tri = Triangle::new(Vec2::new(50.0, 50.0), 10.0, "hsl(0, 100%, 50%)");
        tri.draw(&mut surface);

        let commands = log.borrow();
        match &commands[0] {
            DrawCommand::FillPolygon { points, color } => {
                assert_eq!(points.len(), 3);
                assert_eq!(points[0], Vec2::new(50.0, 40.0));
                assert_eq!(*color, crate::color::Rgba::rgb(255, 0, 0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_shared_handle_is_same_instance() {
        let circle = Handle::new(Circle::new(Vec2::ZERO, 5.0, Circle::DEFAULT_COLOR));
        let shared = share(&circle);
        assert!(shared.same_instance(&circle));
        shared.borrow_mut().set_rotation_speed(2.0);
        assert_eq!(circle.borrow().motion.rotation_speed, 2.0);
    }
}
