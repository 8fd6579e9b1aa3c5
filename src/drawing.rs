//! Drawing-mode simulation: persistent shapes and ephemeral particles.
//!
//! Unlike the game simulation this one owns its surface. The surface is
//! created by [`DrawingSimulation::initialize`] and released by
//! [`DrawingSimulation::teardown`]; frames only render in between.

use rhai::Dynamic;

use crate::color::Rgba;
use crate::console::Severity;
use crate::entity::Handle;
use crate::particle::{Particle, Xorshift64};
use crate::playground::EngineError;
use crate::script_log::emit_log;
use crate::shapes::{share, Circle, Rectangle, SharedShape, Triangle};
use crate::simulation::EntityRegistry;
use crate::surface::{Surface, SurfaceProvider};

pub struct DrawingSimulation {
    shapes: Vec<SharedShape>,
    particles: Vec<Handle<Particle>>,
    trails_enabled: bool,
    background: Rgba,
    width: u32,
    height: u32,
    surface: Option<Box<dyn Surface>>,
    is_initialized: bool,
    rng: Xorshift64,
}

impl DrawingSimulation {
    pub fn new(width: u32, height: u32, background: Rgba, seed: u64) -> Self {
        Self {
            shapes: Vec::new(),
            particles: Vec::new(),
            trails_enabled: false,
            background,
            width,
            height,
            surface: None,
            is_initialized: false,
            rng: Xorshift64::new(seed),
        }
    }

    /// Create the drawing surface. Does nothing when already initialized.
    pub fn initialize(&mut self, provider: &mut dyn SurfaceProvider) -> Result<(), EngineError> {
        if self.is_initialized {
            return Ok(());
        }

        let mut surface = provider.create_surface(self.width, self.height).map_err(|e| {
            log::error!("Drawing surface unavailable: {}", e);
            e
        })?;
        surface.clear(self.background);

        self.surface = Some(surface);
        self.is_initialized = true;
        log::info!("Drawing surface initialized ({}x{})", self.width, self.height);
        Ok(())
    }

    /// Release the surface so a later [`initialize`](Self::initialize) starts fresh.
    pub fn teardown(&mut self) {
        if self.surface.take().is_some() {
            log::info!("Drawing surface detached");
        }
        self.is_initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn surface(&self) -> Option<&dyn Surface> {
        self.surface.as_deref()
    }

    pub fn trails_enabled(&self) -> bool {
        self.trails_enabled
    }

    pub fn set_trails(&mut self, enabled: bool) {
        self.trails_enabled = enabled;
        emit_log(
            Severity::Info,
            &format!("Trails: {}", if enabled { "enabled" } else { "disabled" }),
        );
    }

    /// Add a shape unless this exact instance is already present.
    pub fn add_shape(&mut self, shape: SharedShape) -> bool {
        if self.shapes.iter().any(|s| s.same_instance(&shape)) {
            log::debug!("Duplicate shape prevented: {}", shape.borrow().kind());
            return false;
        }
        self.shapes.push(shape);
        log::debug!("Shape added, {} total", self.shapes.len());
        true
    }

    /// Add a particle unless this exact instance is already present.
    pub fn add_animation(&mut self, particle: Handle<Particle>) -> bool {
        if self.particles.iter().any(|p| p.same_instance(&particle)) {
            log::debug!("Duplicate particle prevented");
            return false;
        }
        self.particles.push(particle);
        true
    }

    pub fn shapes(&self) -> &[SharedShape] {
        &self.shapes
    }

    pub fn particles(&self) -> &[Handle<Particle>] {
        &self.particles
    }

    /// Build a particle with a size from this simulation's seeded generator.
    pub fn spawn_particle(&mut self, position: glam::Vec2, color: String) -> Particle {
        Particle::with_random_size(position, color, &mut self.rng)
    }

    /// Run one frame if initialized. Returns whether a frame was drawn.
    pub fn draw_frame(&mut self) -> bool {
        let Some(surface) = self.surface.as_deref_mut() else {
            return false;
        };

        if !self.trails_enabled {
            surface.clear(self.background);
        }

        let bounds = surface.extent();
        for shape in &self.shapes {
            let mut shape = shape.borrow_mut();
            shape.update(bounds);
            shape.draw(surface);
        }

        for particle in &self.particles {
            let mut particle = particle.borrow_mut();
            particle.update();
            particle.draw(surface);
        }
        self.particles.retain(|p| !p.borrow().is_dead());

        true
    }
}

impl EntityRegistry for DrawingSimulation {
    fn register(&mut self, entity: Dynamic) -> bool {
        if let Some(circle) = entity.clone().try_cast::<Handle<Circle>>() {
            return self.add_shape(share(&circle));
        }
        if let Some(rect) = entity.clone().try_cast::<Handle<Rectangle>>() {
            return self.add_shape(share(&rect));
        }
        if let Some(tri) = entity.clone().try_cast::<Handle<Triangle>>() {
            return self.add_shape(share(&tri));
        }
        if let Some(particle) = entity.clone().try_cast::<Handle<Particle>>() {
            return self.add_animation(particle);
        }
        log::debug!("Ignoring registration of unsupported type {}", entity.type_name());
        false
    }

    /// Logical registries always empty; pixels stay when trails are on.
    /// Empties both registries. Pixels are left alone: with trails off the
    /// next frame clears them, with trails on they are meant to persist.
    fn reset(&mut self) {
        self.shapes.clear();
        self.particles.clear();
    }
}
