//! Software rasterizer backing the headless CLI.
//!
//! Everything is drawn with source-over blending into an `RgbaImage`.
//! Shapes are filled by scanline with pixel-center sampling.

use glam::Vec2;
use image::{Rgba as Pixel, RgbaImage};

use crate::color::Rgba;
use crate::playground::EngineError;
use crate::surface::{Surface, SurfaceProvider};

pub struct PixelSurface {
    image: RgbaImage,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.image.width() || y >= self.image.height() {
            return None;
        }
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Some(Rgba { r, g, b, a })
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        if color.a == 255 {
            *dst = Pixel([color.r, color.g, color.b, 255]);
            return;
        }
        let alpha = color.a as f32 / 255.0;
        let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8;
        let [dr, dg, db, da] = dst.0;
        let out_a = (color.a as f32 + da as f32 * (1.0 - alpha)).round().min(255.0) as u8;
        *dst = Pixel([mix(color.r, dr), mix(color.g, dg), mix(color.b, db), out_a]);
    }

    /// Fill the horizontal span `[x0, x1)` on row `y`, clipped to the image.
    fn span(&mut self, y: i64, x0: f32, x1: f32, color: Rgba) {
        let start = x0.round().max(0.0) as i64;
        let end = x1.round().min(self.image.width() as f32) as i64;
        for x in start..end {
            self.blend(x, y, color);
        }
    }

    fn rows(&self, top: f32, bottom: f32) -> std::ops::Range<i64> {
        if !top.is_finite() || !bottom.is_finite() {
            return 0..0;
        }
        let first = top.floor().max(0.0) as i64;
        let last = bottom.ceil().min(self.image.height() as f32) as i64;
        first..last.max(first)
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self, color: Rgba) {
        for px in self.image.pixels_mut() {
            *px = Pixel([color.r, color.g, color.b, color.a]);
        }
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        if !origin.is_finite() || !size.is_finite() {
            return;
        }
        let min = origin.min(origin + size);
        let max = origin.max(origin + size);
        for y in self.rows(min.y, max.y) {
            let cy = y as f32 + 0.5;
            if cy < min.y || cy >= max.y {
                continue;
            }
            self.span(y, min.x, max.x, color);
        }
    }

    fn stroke_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba, line_width: f32) {
        let w = line_width.max(1.0);
        self.fill_rect(origin, Vec2::new(size.x, w), color);
        self.fill_rect(origin + Vec2::new(0.0, size.y - w), Vec2::new(size.x, w), color);
        self.fill_rect(origin + Vec2::new(0.0, w), Vec2::new(w, size.y - 2.0 * w), color);
        self.fill_rect(
            origin + Vec2::new(size.x - w, w),
            Vec2::new(w, size.y - 2.0 * w),
            color,
        );
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius <= 0.0 || !radius.is_finite() || !center.is_finite() {
            return;
        }
        for y in self.rows(center.y - radius, center.y + radius) {
            let dy = y as f32 + 0.5 - center.y;
            let sq = radius * radius - dy * dy;
            if sq < 0.0 {
                continue;
            }
            let half = sq.sqrt();
            self.span(y, center.x - half, center.x + half, color);
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Rgba, line_width: f32) {
        if !center.is_finite() || !radius.is_finite() || !line_width.is_finite() {
            return;
        }
        let outer = radius + line_width / 2.0;
        let inner = (radius - line_width / 2.0).max(0.0);
        for y in self.rows(center.y - outer, center.y + outer) {
            let dy = y as f32 + 0.5 - center.y;
            let outer_sq = outer * outer - dy * dy;
            if outer_sq < 0.0 {
                continue;
            }
            let outer_half = outer_sq.sqrt();
            let inner_sq = inner * inner - dy * dy;
            if inner_sq <= 0.0 {
                self.span(y, center.x - outer_half, center.x + outer_half, color);
            } else {
                let inner_half = inner_sq.sqrt();
                self.span(y, center.x - outer_half, center.x - inner_half, color);
                self.span(y, center.x + inner_half, center.x + outer_half, color);
            }
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba, line_width: f32) {
        if !from.is_finite() || !to.is_finite() || !line_width.is_finite() {
            return;
        }
        let delta = to - from;
        let steps = delta.abs().max_element().ceil().max(1.0) as usize;
        let half = (line_width.max(1.0) / 2.0).floor() as i64;
        for i in 0..=steps {
            let p = from + delta * (i as f32 / steps as f32);
            let (px, py) = (p.x.floor() as i64, p.y.floor() as i64);
            for oy in -half..=half {
                for ox in -half..=half {
                    self.blend(px + ox, py + oy, color);
                }
            }
        }
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        if points.len() < 3 || !points.iter().all(|p| p.is_finite()) {
            return;
        }
        let top = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let bottom = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let mut crossings = Vec::with_capacity(points.len());
        for y in self.rows(top, bottom) {
            let cy = y as f32 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= cy && b.y > cy) || (b.y <= cy && a.y > cy) {
                    let t = (cy - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
            crossings.sort_by(|l, r| l.total_cmp(r));
            for pair in crossings.chunks_exact(2) {
                self.span(y, pair[0], pair[1], color);
            }
        }
    }

    fn to_image(&self) -> Option<RgbaImage> {
        Some(self.image.clone())
    }
}

/// Provider handing out [`PixelSurface`]s.
#[derive(Debug, Default)]
pub struct PixelProvider;

impl SurfaceProvider for PixelProvider {
    fn create_surface(&mut self, width: u32, height: u32) -> Result<Box<dyn Surface>, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::Initialization {
                message: format!("cannot create a {width}x{height} surface"),
            });
        }
        Ok(Box::new(PixelSurface::new(width, height)))
    }
}
