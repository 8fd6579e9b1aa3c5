//! Game-mode simulation: snakes and bouncing balls on a raster canvas.

use std::cell::RefCell;

use glam::Vec2;
use rhai::Dynamic;

use crate::bouncing_ball::BouncingBall;
use crate::color::Rgba;
use crate::entity::Handle;
use crate::snake::Snake;
use crate::surface::Surface;

/// A collection scripts register freshly constructed entities into.
pub trait EntityRegistry {
    /// Add `entity` if it is a type this registry simulates.
    /// Anything else is ignored and `false` is returned.
    fn register(&mut self, entity: Dynamic) -> bool;

    /// Drop every registered entity.
    fn reset(&mut self);
}

/// Wrap `value` in a handle, register it, and hand the same handle back.
///
/// This is what every script constructor does; the caller keeps the handle
/// so later method calls mutate the registered instance.
pub fn spawn<R: EntityRegistry + ?Sized, T: 'static>(registry: &RefCell<R>, value: T) -> Handle<T> {
    let handle = Handle::new(value);
    registry.borrow_mut().register(Dynamic::from(handle.clone()));
    handle
}

/// Background and grid used by the game render pass.
#[derive(Debug, Clone)]
pub struct GameStyle {
    pub background: Rgba,
    /// Grid line color and spacing; `None` disables the grid.
    pub grid: Option<(Rgba, f32)>,
}

impl Default for GameStyle {
    fn default() -> Self {
        Self {
            background: Rgba::BLACK,
            grid: Some((Rgba::rgb(0x33, 0x33, 0x33), 20.0)),
        }
    }
}

/// Insertion order is update order and draw order.
#[derive(Default)]
pub struct Simulation {
    snakes: Vec<Handle<Snake>>,
    balls: Vec<Handle<BouncingBall>>,
    style: GameStyle,
}

impl Simulation {
    pub fn new(style: GameStyle) -> Self {
        Self {
            snakes: Vec::new(),
            balls: Vec::new(),
            style,
        }
    }

    pub fn add_snake(&mut self, snake: Handle<Snake>) {
        self.snakes.push(snake);
        log::debug!("Snake registered, {} total", self.snakes.len());
    }

    pub fn add_ball(&mut self, ball: Handle<BouncingBall>) {
        self.balls.push(ball);
        log::debug!("BouncingBall registered, {} total", self.balls.len());
    }

    pub fn snakes(&self) -> &[Handle<Snake>] {
        &self.snakes
    }

    pub fn balls(&self) -> &[Handle<BouncingBall>] {
        &self.balls
    }

    pub fn len(&self) -> usize {
        self.snakes.len() + self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every snake, then every ball.
    pub fn update(&mut self, extent: Vec2) {
        for snake in &self.snakes {
            snake.borrow_mut().update(extent);
        }
        for ball in &self.balls {
            ball.borrow_mut().update(extent);
        }
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        surface.clear(self.style.background);
        if let Some((color, spacing)) = self.style.grid {
            draw_grid(surface, color, spacing);
        }
        for snake in &self.snakes {
            snake.borrow().draw(surface);
        }
        for ball in &self.balls {
            ball.borrow().draw(surface);
        }
    }

    /// One full tick: all updates complete before anything is drawn.
    pub fn tick(&mut self, surface: &mut dyn Surface) {
        self.update(surface.extent());
        self.render(surface);
    }
}

impl EntityRegistry for Simulation {
    fn register(&mut self, entity: Dynamic) -> bool {
        if entity.is::<Handle<Snake>>() {
            if let Some(snake) = entity.try_cast::<Handle<Snake>>() {
                self.add_snake(snake);
                return true;
            }
        } else if entity.is::<Handle<BouncingBall>>() {
            if let Some(ball) = entity.try_cast::<Handle<BouncingBall>>() {
                self.add_ball(ball);
                return true;
            }
        } else {
            log::debug!("Ignoring registration of unsupported type {}", entity.type_name());
        }
        false
    }

    fn reset(&mut self) {
        self.snakes.clear();
        self.balls.clear();
    }
}

fn draw_grid(surface: &mut dyn Surface, color: Rgba, spacing: f32) {
    if spacing <= 0.0 {
        return;
    }
    let extent = surface.extent();
    let mut x = 0.0;
    while x <= extent.x {
        surface.line(Vec2::new(x, 0.0), Vec2::new(x, extent.y), color, 1.0);
        x += spacing;
    }
    let mut y = 0.0;
    while y <= extent.y {
        surface.line(Vec2::new(0.0, y), Vec2::new(extent.x, y), color, 1.0);
        y += spacing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordingSurface};

    #[test]
    fn test_register_is_type_checked() {
        let mut sim = Simulation::default();
        assert!(sim.register(Dynamic::from(Handle::new(Snake::new(Vec2::ZERO)))));
        assert!(sim.register(Dynamic::from(Handle::new(BouncingBall::new(Vec2::ZERO, 5.0)))));
        assert!(!sim.register(Dynamic::from(42_i64)));
        assert!(!sim.register(Dynamic::from("Snake")));

        assert_eq!(sim.snakes().len(), 1);
        assert_eq!(sim.balls().len(), 1);

        sim.reset();
        assert!(sim.is_empty());
    }

    #[test]
    fn test_spawn_returns_registered_instance() {
        let sim = RefCell::new(Simulation::default());
        let snake = spawn(&sim, Snake::new(Vec2::new(10.0, 10.0)));
        snake.borrow_mut().set_speed(5.0);

        let sim = sim.borrow();
        assert!(sim.snakes()[0].same_instance(&snake));
        assert_eq!(sim.snakes()[0].borrow().speed(), 5.0);
    }

    #[test]
    fn test_render_order_follows_registration() {
        let mut sim = Simulation::new(GameStyle { grid: None, ..GameStyle::default() });
        sim.add_ball(Handle::new(BouncingBall::new(Vec2::new(100.0, 100.0), 10.0)));
        sim.add_snake(Handle::new(Snake::new(Vec2::new(50.0, 50.0))));

        let mut surface = RecordingSurface::new(400, 400);
        let log = surface.log();
        sim.render(&mut surface);

        let commands = log.borrow();
        assert!(matches!(commands[0], DrawCommand::Clear { color } if color == Rgba::BLACK));
        // Snakes always draw before balls so balls end up on top.
        assert!(matches!(commands[1], DrawCommand::FillRect { .. }));
        assert!(matches!(commands[3], DrawCommand::FillCircle { .. }));
    }

    #[test]
    fn test_grid_lines_every_spacing() {
        let sim = Simulation::default();
        let mut surface = RecordingSurface::new(400, 400);
        let log = surface.log();
        sim.render(&mut surface);

        let lines = log
            .borrow()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count();
        // 21 vertical + 21 horizontal lines on a 400px canvas with 20px spacing.
        assert_eq!(lines, 42);
    }

    #[test]
    fn test_tick_updates_before_drawing() {
        let mut sim = Simulation::new(GameStyle { grid: None, ..GameStyle::default() });
        let snake = Handle::new(Snake::new(Vec2::new(200.0, 200.0)));
        snake.borrow_mut().set_speed(3.0);
        sim.add_snake(snake.clone());

        let mut surface = RecordingSurface::new(400, 400);
        let log = surface.log();
        sim.tick(&mut surface);

        assert_eq!(snake.borrow().position, Vec2::new(203.0, 200.0));
        let commands = log.borrow();
        assert!(matches!(
            commands[1],
            DrawCommand::FillRect { origin, .. } if origin == Vec2::new(193.0, 190.0)
        ));
    }
}
