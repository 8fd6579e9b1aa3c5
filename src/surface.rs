//! The 2D drawing seam.
//!
//! Entities only ever draw through [`Surface`]. The playground never owns a
//! concrete backend: it asks a [`SurfaceProvider`] for one when a mode starts
//! and drops it when the mode stops.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::Serialize;

use crate::color::Rgba;
use crate::playground::EngineError;

/// Immediate-mode 2D drawing target.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Surface extents as floats, the bounds entities update against.
    fn extent(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);
    fn stroke_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, line_width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32);
    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba, line_width: f32);
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);

    /// Export the current pixels, for backends that have any.
    fn to_image(&self) -> Option<image::RgbaImage> {
        None
    }
}

/// Creates surfaces on demand. A failure here is an initialization error.
pub trait SurfaceProvider {
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, EngineError>;
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { color: Rgba },
    FillRect { origin: Vec2, size: Vec2, color: Rgba },
    StrokeRect { origin: Vec2, size: Vec2, color: Rgba, line_width: f32 },
    FillCircle { center: Vec2, radius: f32, color: Rgba },
    StrokeCircle { center: Vec2, radius: f32, color: Rgba, line_width: f32 },
    Line { from: Vec2, to: Vec2, color: Rgba, line_width: f32 },
    FillPolygon { points: Vec<Vec2>, color: Rgba },
}

/// Shared command log, readable while the surface is owned elsewhere.
pub type CommandLog = Rc<RefCell<Vec<DrawCommand>>>;

/// Surface that records every call instead of rasterizing.
pub struct RecordingSurface {
    width: u32,
    height: u32,
    log: CommandLog,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_log(width, height, CommandLog::default())
    }

    pub fn with_log(width: u32, height: u32, log: CommandLog) -> Self {
        Self { width, height, log }
    }

    pub fn log(&self) -> CommandLog {
        Rc::clone(&self.log)
    }

    fn push(&mut self, command: DrawCommand) {
        self.log.borrow_mut().push(command);
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        self.push(DrawCommand::Clear { color });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.push(DrawCommand::FillRect { origin, size, color });
    }

    fn stroke_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, line_width: f32) {
        self.push(DrawCommand::StrokeRect { origin, size, color, line_width });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.push(DrawCommand::FillCircle { center, radius, color });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32) {
        self.push(DrawCommand::StrokeCircle { center, radius, color, line_width });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba, line_width: f32) {
        self.push(DrawCommand::Line { from, to, color, line_width });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.push(DrawCommand::FillPolygon { points: points.to_vec(), color });
    }
}

/// Provider handing out [`RecordingSurface`]s.
///
/// Every surface it creates writes into the same log, so a test can keep a
/// handle to it across mode switches. `fail` simulates an unavailable backend.
#[derive(Default)]
pub struct RecordingProvider {
    pub log: CommandLog,
    pub fail: bool,
    /// Extents of every surface created so far, in order.
    pub created: Rc<RefCell<Vec<(u32, u32)>>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceProvider for RecordingProvider {
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, EngineError> {
        if self.fail {
            return Err(EngineError::Initialization {
                message: "no rendering surface available".to_string(),
            });
        }
        self.created.borrow_mut().push((width, height));
        Ok(Box::new(RecordingSurface::with_log(width, height, Rc::clone(&self.log))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_surface_logs_calls_in_order() {
        let mut surface = RecordingSurface::new(100, 50);
        let log = surface.log();

        surface.clear(Rgba::BLACK);
        surface.fill_circle(Vec2::new(10.0, 10.0), 5.0, Rgba::WHITE);

        let commands = log.borrow();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], DrawCommand::Clear { color: Rgba::BLACK });
        assert!(matches!(commands[1], DrawCommand::FillCircle { radius, .. } if radius == 5.0));
        assert_eq!(surface.extent(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn test_failing_provider_reports_initialization_error() {
        let mut provider = RecordingProvider { fail: true, ..Default::default() };
        let err = provider.create_surface(10, 10).err().expect("provider should fail");
        assert!(matches!(err, EngineError::Initialization { .. }));
        assert!(provider.created.borrow().is_empty());
    }

    #[test]
    fn test_draw_command_json_is_tagged() {
        let command = DrawCommand::FillCircle {
            center: Vec2::new(1.0, 2.0),
            radius: 3.0,
            color: Rgba::WHITE,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["op"], "fill_circle");
        assert_eq!(json["center"], serde_json::json!([1.0, 2.0]));
        assert_eq!(json["radius"], 3.0);
    }
}
