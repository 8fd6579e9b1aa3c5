//! Ephemeral particles of drawing mode.
//!
//! A particle fades out as its `life` decays from 255; the drawing
//! simulation drops it on the first tick where `life <= 0`.

use std::fmt;

use glam::Vec2;

use crate::color::resolve_color;
use crate::surface::Surface;

pub const INITIAL_LIFE: f32 = 255.0;

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: String,
    pub life: f32,
    pub decay: f32,
    /// Diameter in pixels.
    pub size: f32,
    pub gravity: f32,
}

impl Particle {
    pub const DEFAULT_COLOR: &'static str = "#ff00ff";

    pub fn new(position: Vec2, color: impl Into<String>, size: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            color: color.into(),
            life: INITIAL_LIFE,
            decay: 2.0,
            size,
            gravity: 0.1,
        }
    }

    /// Size drawn uniformly from `[5, 15)`.
    pub fn with_random_size(position: Vec2, color: impl Into<String>, rng: &mut Xorshift64) -> Self {
        Self::new(position, color, 5.0 + rng.next_f32() * 10.0)
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    pub fn update(&mut self) {
        self.position += self.velocity;
        self.life -= self.decay;
        if self.gravity != 0.0 {
            self.velocity.y += self.gravity;
        }
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    /// Remaining life as an alpha channel.
    pub fn alpha(&self) -> u8 {
        self.life.floor().clamp(0.0, 255.0) as u8
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        let color = resolve_color(&self.color).with_alpha(self.alpha());
        surface.fill_circle(self.position, self.size / 2.0, color);
    }
}

impl fmt::Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Particle({}, {}) life={}", self.position.x, self.position.y, self.life)
    }
}

/// xorshift64 for deterministic randomness.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    pub fn new(seed: u64) -> Self {
        // Seed 0 is degenerate (produces all zeros)
        let state = if seed == 0 { 0x5DEECE66D } else { seed };
        Self { state }
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        // Top 24 bits fit an f32 mantissa exactly.
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks_until_dead(decay: f32) -> usize {
        let mut p = Particle::new(Vec2::ZERO, Particle::DEFAULT_COLOR, 5.0);
        p.decay = decay;
        let mut ticks = 0;
        while !p.is_dead() {
            p.update();
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn test_dies_after_ceil_life_over_decay_ticks() {
        for decay in [1.0_f32, 2.0, 3.0, 5.0, 7.0, 255.0, 300.0] {
            let expected = (INITIAL_LIFE / decay).ceil() as usize;
            assert_eq!(ticks_until_dead(decay), expected, "decay {decay}");
        }
    }

    #[test]
    fn test_gravity_accelerates_downwards() {
        let mut p = Particle::new(Vec2::new(10.0, 10.0), "#fff", 5.0);
        p.update();
        assert_eq!(p.position, Vec2::new(10.0, 10.0));
        assert!((p.velocity.y - 0.1).abs() < 1e-6);

        p.set_gravity(0.0);
        p.velocity = Vec2::new(1.0, 0.5);
        p.update();
        assert_eq!(p.position, Vec2::new(11.0, 10.5));
        assert_eq!(p.velocity.y, 0.5);
    }

    #[test]
    fn test_life_never_increases() {
        let mut p = Particle::new(Vec2::ZERO, "#fff", 5.0);
        let mut last = p.life;
        for _ in 0..20 {
            p.update();
            assert!(p.life <= last);
            last = p.life;
        }
    }

    #[test]
    fn test_alpha_follows_life() {
        let mut p = Particle::new(Vec2::ZERO, "#fff", 5.0);
        assert_eq!(p.alpha(), 255);
        p.life = 100.7;
        assert_eq!(p.alpha(), 100);
        p.life = -3.0;
        assert_eq!(p.alpha(), 0);
    }

    #[test]
    fn test_random_size_is_deterministic_and_in_range() {
        let mut a = Xorshift64::new(42);
        let mut b = Xorshift64::new(42);
        for _ in 0..100 {
            let pa = Particle::with_random_size(Vec2::ZERO, "#fff", &mut a);
            let pb = Particle::with_random_size(Vec2::ZERO, "#fff", &mut b);
            assert_eq!(pa.size, pb.size);
            assert!((5.0..15.0).contains(&pa.size));
        }
    }
}
