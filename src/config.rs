//! Playground configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes: `{ "showGrid": false, "maxOperations": 500000 }` is a complete file.

use serde::{Deserialize, Serialize};

use crate::color::resolve_color;
use crate::console::DEFAULT_CAPACITY;
use crate::simulation::GameStyle;

fn default_game_extent() -> u32 {
    400
}

fn default_drawing_width() -> u32 {
    1200
}

fn default_drawing_height() -> u32 {
    600
}

fn default_game_background() -> String {
    "#000000".to_string()
}

fn default_grid_color() -> String {
    "#333333".to_string()
}

fn default_grid_spacing() -> f32 {
    20.0
}

fn default_true() -> bool {
    true
}

fn default_drawing_background() -> String {
    "#ffffff".to_string()
}

fn default_console_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_particle_seed() -> u64 {
    0x9E37_79B9_7F4A_7C15
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundConfig {
    #[serde(default = "default_game_extent")]
    pub game_width: u32,

    #[serde(default = "default_game_extent")]
    pub game_height: u32,

    #[serde(default = "default_drawing_width")]
    pub drawing_width: u32,

    #[serde(default = "default_drawing_height")]
    pub drawing_height: u32,

    #[serde(default = "default_game_background")]
    pub game_background: String,

    #[serde(default = "default_grid_color")]
    pub grid_color: String,

    /// Pixels between grid lines.
    #[serde(default = "default_grid_spacing")]
    pub grid_spacing: f32,

    #[serde(default = "default_true")]
    pub show_grid: bool,

    #[serde(default = "default_drawing_background")]
    pub drawing_background: String,

    /// Console entries kept before the oldest is evicted.
    #[serde(default = "default_console_capacity")]
    pub console_capacity: usize,

    /// Seed for particle sizes; the same seed gives the same sizes.
    #[serde(default = "default_particle_seed")]
    pub particle_seed: u64,

    /// Rhai operation limit per script run. 0 means unlimited.
    #[serde(default)]
    pub max_operations: u64,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            game_width: default_game_extent(),
            game_height: default_game_extent(),
            drawing_width: default_drawing_width(),
            drawing_height: default_drawing_height(),
            game_background: default_game_background(),
            grid_color: default_grid_color(),
            grid_spacing: default_grid_spacing(),
            show_grid: true,
            drawing_background: default_drawing_background(),
            console_capacity: default_console_capacity(),
            particle_seed: default_particle_seed(),
            max_operations: 0,
        }
    }
}

impl PlaygroundConfig {
    /// Load a config from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
    }

    pub fn game_style(&self) -> GameStyle {
        GameStyle {
            background: resolve_color(&self.game_background),
            grid: self
                .show_grid
                .then(|| (resolve_color(&self.grid_color), self.grid_spacing)),
        }
    }
}
