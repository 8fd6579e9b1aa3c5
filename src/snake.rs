//! The crawling sprite of snake mode.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;

use crate::color::{resolve_color, Rgba};
use crate::surface::Surface;

pub const MIN_SPEED: f32 = 0.1;
pub const MAX_SPEED: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(format!("unknown direction '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snake {
    pub position: Vec2,
    pub size: f32,
    pub color: String,
    direction: Direction,
    speed: f32,
    velocity: Vec2,
}

impl Snake {
    pub fn new(position: Vec2) -> Self {
        let mut snake = Self {
            position,
            size: 20.0,
            color: "#00ff00".to_string(),
            direction: Direction::Right,
            speed: 1.0,
            velocity: Vec2::ZERO,
        };
        snake.update_velocity();
        snake
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// Clamped to `[MIN_SPEED, MAX_SPEED]`.
    pub fn set_speed(&mut self, speed: f32) {
        // NaN would survive clamp; treat it as the slowest crawl.
        self.speed = if speed.is_nan() { MIN_SPEED } else { speed.clamp(MIN_SPEED, MAX_SPEED) };
        self.update_velocity();
    }

    pub fn turn(&mut self, direction: Direction) {
        self.direction = direction;
        self.update_velocity();
    }

    fn update_velocity(&mut self) {
        self.velocity = self.direction.unit() * self.speed;
    }

    /// Advance one tick, wrapping to the opposite edge when leaving `[0, extent]`.
    pub fn update(&mut self, extent: Vec2) {
        self.position += self.velocity;

        if self.position.x < 0.0 {
            self.position.x = extent.x;
        } else if self.position.x > extent.x {
            self.position.x = 0.0;
        }
        if self.position.y < 0.0 {
            self.position.y = extent.y;
        } else if self.position.y > extent.y {
            self.position.y = 0.0;
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        let origin = self.position - Vec2::splat(self.size / 2.0);
        let size = Vec2::splat(self.size);
        surface.fill_rect(origin, size, resolve_color(&self.color));
        surface.stroke_rect(origin, size, Rgba::BLACK, 1.0);
    }
}

impl fmt::Display for Snake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Snake({}, {}) moving {:?} at {}",
            self.position.x, self.position.y, self.direction, self.speed
        )
    }
}
