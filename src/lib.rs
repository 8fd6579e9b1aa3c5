pub mod color;
pub mod config;
pub mod console;
pub mod playground;
pub mod scheduler;
pub mod surface;
pub mod raster;

// Scripting
pub mod script_host;
pub mod script_log;
pub mod script_api;
pub mod script_diagnostics;
pub mod presets;

// Game mode
pub mod entity;
pub mod simulation;
pub mod snake;
pub mod bouncing_ball;
pub mod game_rhai;

// Drawing mode
pub mod shapes;
pub mod particle;
pub mod drawing;
pub mod drawing_rhai;

pub mod render_job;
pub mod cli;
