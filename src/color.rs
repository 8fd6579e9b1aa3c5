//! Color resolution for script-supplied color strings.
//!
//! Scripts pass colors as strings. Supported forms:
//! - `#rrggbb` and the `#rgb` shorthand
//! - `hsl(h, s%, l%)`
//! - a handful of CSS basic names (`red`, `green`, ...)
//!
//! Anything else resolves to magenta so a typo is visible on screen
//! instead of silently drawing nothing.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    /// Returned for any color string that cannot be parsed.
    pub const SENTINEL: Rgba = Rgba::rgb(255, 0, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

fn hsl_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^hsl\(\s*([^,]+),\s*([^,]+)%\s*,\s*([^)]+)%\s*\)$")
            .expect("hsl pattern is valid")
    })
}

/// Resolve a color string to RGBA. Never fails; unknown input yields [`Rgba::SENTINEL`].
pub fn resolve_color(input: &str) -> Rgba {
    let trimmed = input.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex).unwrap_or(Rgba::SENTINEL);
    }

    if trimmed.starts_with("hsl") {
        return parse_hsl(trimmed).unwrap_or(Rgba::SENTINEL);
    }

    named_color(trimmed).unwrap_or(Rgba::SENTINEL)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba::rgb(r, g, b))
        }
        3 => {
            let mut channels = [0u8; 3];
            for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                let v = digit.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(Rgba::rgb(channels[0], channels[1], channels[2]))
        }
        _ => None,
    }
}

fn parse_hsl(input: &str) -> Option<Rgba> {
    let caps = hsl_pattern().captures(input)?;
    let h: f32 = caps.get(1)?.as_str().trim().parse().ok()?;
    let s: f32 = caps.get(2)?.as_str().trim().parse().ok()?;
    let l: f32 = caps.get(3)?.as_str().trim().parse().ok()?;
    if !(h.is_finite() && s.is_finite() && l.is_finite()) {
        return None;
    }
    let [r, g, b] = hsl_to_rgb(h, s, l);
    Some(Rgba::rgb(r, g, b))
}

/// Convert HSL (hue in degrees, saturation and lightness in percent) to RGB
/// using the six 60-degree sector formula.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = (s / 100.0).clamp(0.0, 1.0);
    let l = (l / 100.0).clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 1.0 / 6.0 {
        (c, x, 0.0)
    } else if h < 2.0 / 6.0 {
        (x, c, 0.0)
    } else if h < 3.0 / 6.0 {
        (0.0, c, x)
    } else if h < 4.0 / 6.0 {
        (0.0, x, c)
    } else if h < 5.0 / 6.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(r), channel(g), channel(b)]
}

fn named_color(name: &str) -> Option<Rgba> {
    let rgb = match name.to_ascii_lowercase().as_str() {
        "black" => Rgba::rgb(0, 0, 0),
        "white" => Rgba::rgb(255, 255, 255),
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "lime" => Rgba::rgb(0, 255, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "navy" => Rgba::rgb(0, 0, 128),
        "yellow" => Rgba::rgb(255, 255, 0),
        "cyan" | "aqua" => Rgba::rgb(0, 255, 255),
        "teal" => Rgba::rgb(0, 128, 128),
        "magenta" | "fuchsia" => Rgba::rgb(255, 0, 255),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "pink" => Rgba::rgb(255, 192, 203),
        "brown" => Rgba::rgb(165, 42, 42),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        _ => return None,
    };
    Some(rgb)
}
