//! Gravity-driven ball of ball mode.

use std::fmt;

use glam::Vec2;

use crate::color::{resolve_color, Rgba};
use crate::surface::Surface;

/// Velocity retained on every bounce, on top of bounciness.
pub const FRICTION: f32 = 0.99;

#[derive(Debug, Clone)]
pub struct BouncingBall {
    pub position: Vec2,
    pub radius: f32,
    pub color: String,
    pub velocity: Vec2,
    pub gravity: f32,
    bounciness: f32,
}

impl BouncingBall {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            radius,
            color: "#ff0000".to_string(),
            velocity: Vec2::ZERO,
            gravity: 0.0,
            bounciness: 0.8,
        }
    }

    pub fn bounciness(&self) -> f32 {
        self.bounciness
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Clamped to `[0, 1]`.
    pub fn set_bounce(&mut self, bounciness: f32) {
        self.bounciness = if bounciness.is_nan() { 0.0 } else { bounciness.clamp(0.0, 1.0) };
    }

    pub fn update(&mut self, extent: Vec2) {
        self.velocity.y += self.gravity;
        self.position += self.velocity;

        let damping = self.bounciness * FRICTION;
        let r = self.radius;

        if self.position.x - r <= 0.0 {
            self.position.x = r;
            self.velocity.x = -self.velocity.x * damping;
        } else if self.position.x + r >= extent.x {
            self.position.x = extent.x - r;
            self.velocity.x = -self.velocity.x * damping;
        }

        if self.position.y - r <= 0.0 {
            self.position.y = r;
            self.velocity.y = -self.velocity.y * damping;
        } else if self.position.y + r >= extent.y {
            self.position.y = extent.y - r;
            self.velocity.y = -self.velocity.y * damping;
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_circle(self.position, self.radius, resolve_color(&self.color));
        surface.stroke_circle(self.position, self.radius, Rgba::BLACK, 1.0);
    }
}

impl fmt::Display for BouncingBall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BouncingBall({}, {}, r={}) v=({}, {})",
            self.position.x, self.position.y, self.radius, self.velocity.x, self.velocity.y
        )
    }
}
