//! Render job specification and metadata.
//!
//! A render job runs one script headlessly for a fixed number of frames,
//! writing PNG frames and a metadata.json describing the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::PlaygroundConfig;
use crate::console::ConsoleEntry;
use crate::playground::{LoopKind, Mode, Playground};
use crate::raster::PixelProvider;
use crate::scheduler::ManualScheduler;
use crate::script_diagnostics::ScriptDiagnostic;
use crate::script_host::ExecutionOutcome;

/// Default number of frames to render.
fn default_frames() -> usize {
    120
}

fn default_save_frames() -> bool {
    true
}

/// Specification for a single render job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderJobSpec {
    /// Path to the Rhai script.
    pub script_path: PathBuf,

    /// Mode the script runs in.
    pub mode: Mode,

    /// Output directory for frames and metadata.
    pub output_dir: PathBuf,

    #[serde(default = "default_frames")]
    pub frames: usize,

    /// Keep previous frames on the drawing surface.
    #[serde(default)]
    pub trails: bool,

    /// Overrides the config's particle seed.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Write a PNG per frame. Metadata is always written.
    #[serde(default = "default_save_frames")]
    pub save_frames: bool,

    /// Optional playground config file.
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

impl RenderJobSpec {
    /// Create a new render job spec with required fields only.
    pub fn new(script_path: PathBuf, mode: Mode, output_dir: PathBuf) -> Self {
        Self {
            script_path,
            mode,
            output_dir,
            frames: default_frames(),
            trails: false,
            seed: None,
            save_frames: default_save_frames(),
            config_path: None,
        }
    }

    /// Validate the job specification.
    pub fn validate(&self) -> Result<(), String> {
        if !self.script_path.exists() {
            return Err(format!("Script file not found: {:?}", self.script_path));
        }
        if let Some(config) = &self.config_path {
            if !config.exists() {
                return Err(format!("Config file not found: {:?}", config));
            }
        }
        if self.frames == 0 {
            return Err("Frame count must be positive".to_string());
        }
        Ok(())
    }

    /// Load the playground config this job runs with.
    pub fn load_config(&self) -> Result<PlaygroundConfig, String> {
        let mut config = match &self.config_path {
            Some(path) => PlaygroundConfig::from_file(path)?,
            None => PlaygroundConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.particle_seed = seed;
        }
        Ok(config)
    }

    /// Path of the PNG for a 0-based frame index.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{:05}.png", index))
    }
}

/// Entities alive at the end of a render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub snakes: usize,
    pub balls: usize,
    pub shapes: usize,
    pub particles: usize,
}

/// Metadata for a completed render.
/// Written as metadata.json alongside rendered frames.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderMetadata {
    /// The job specification used.
    pub job: RenderJobSpec,

    /// Timestamp when render started (ISO 8601).
    pub started_at: DateTime<Utc>,

    /// Timestamp when render completed (ISO 8601).
    pub completed_at: DateTime<Utc>,

    /// Total render duration in seconds.
    pub render_duration_secs: f64,

    /// Total frames rendered.
    pub frame_count: usize,

    /// SHA-256 hash of the script content.
    pub script_hash: String,

    pub codeplay_version: String,

    pub width: u32,
    pub height: u32,

    pub entities: EntityCounts,

    /// Whether the script ran to completion.
    pub script_completed: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<ScriptDiagnostic>,

    /// Console contents at the end of the render.
    pub console: Vec<ConsoleEntry>,

    /// Any warnings or issues during render.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RenderMetadata {
    /// Compute SHA-256 hash of file content.
    pub fn hash_file(path: &Path) -> Result<String, std::io::Error> {
        use std::io::Read;

        let mut file = std::fs::File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Save metadata to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize metadata: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write metadata: {}", e))
    }
}

/// Render phase for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Initialization,
    ScriptLoading,
    FrameRender,
    FrameSave,
    MetadataSave,
}

impl std::fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderPhase::Initialization => write!(f, "Initialization"),
            RenderPhase::ScriptLoading => write!(f, "Script Loading"),
            RenderPhase::FrameRender => write!(f, "Frame Render"),
            RenderPhase::FrameSave => write!(f, "Frame Save"),
            RenderPhase::MetadataSave => write!(f, "Metadata Save"),
        }
    }
}

/// Structured error for render failures.
#[derive(Debug)]
pub struct RenderError {
    pub phase: RenderPhase,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl RenderError {
    /// Create a new render error.
    pub fn new(phase: RenderPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            message: message.into(),
            source: None,
        }
    }

    /// Create a render error with a source error.
    pub fn with_source(
        phase: RenderPhase,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            phase,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Progress information for render callbacks.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    /// Current frame number (1-indexed).
    pub current_frame: usize,
    /// Total frames to render.
    pub total_frames: usize,
    /// Elapsed time in seconds.
    pub elapsed_secs: f64,
}

impl RenderProgress {
    /// Get progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total_frames == 0 {
            100.0
        } else {
            (self.current_frame as f64 / self.total_frames as f64) * 100.0
        }
    }
}

/// Run a render job to completion.
///
/// A script error does not abort the render: it is recorded in the
/// metadata and whatever the script registered before failing is rendered.
pub fn run_job(
    spec: &RenderJobSpec,
    mut on_progress: impl FnMut(&RenderProgress),
) -> Result<RenderMetadata, RenderError> {
    let started_at = Utc::now();
    let clock = Instant::now();

    spec.validate()
        .map_err(|e| RenderError::new(RenderPhase::Initialization, e))?;
    let config = spec
        .load_config()
        .map_err(|e| RenderError::new(RenderPhase::Initialization, e))?;

    let source = std::fs::read_to_string(&spec.script_path).map_err(|e| {
        RenderError::with_source(RenderPhase::ScriptLoading, "Failed to read script", e)
    })?;
    let script_hash = RenderMetadata::hash_file(&spec.script_path).map_err(|e| {
        RenderError::with_source(RenderPhase::ScriptLoading, "Failed to hash script", e)
    })?;

    if spec.save_frames {
        std::fs::create_dir_all(&spec.output_dir).map_err(|e| {
            RenderError::with_source(RenderPhase::FrameSave, "Failed to create output directory", e)
        })?;
    }

    let (width, height) = match spec.mode.loop_kind() {
        LoopKind::Game => (config.game_width, config.game_height),
        LoopKind::Drawing => (config.drawing_width, config.drawing_height),
    };

    let mut playground = Playground::new(config, ManualScheduler::new(), Box::new(PixelProvider));
    // The playground owns this thread's console interception; release it on
    // every exit path.
    let outcome = match drive(&mut playground, spec, &source, &clock, &mut on_progress) {
        Ok(outcome) => outcome,
        Err(e) => {
            playground.shutdown();
            return Err(e);
        }
    };

    let mut warnings = Vec::new();
    if let ExecutionOutcome::Failed(diagnostic) = &outcome {
        warnings.push(diagnostic.console_message());
    }

    let entities = {
        let simulation = playground.simulation();
        let drawing = playground.drawing();
        EntityCounts {
            snakes: simulation.snakes().len(),
            balls: simulation.balls().len(),
            shapes: drawing.shapes().len(),
            particles: drawing.particles().len(),
        }
    };
    let console = playground.console_entries();
    let diagnostics = playground.take_diagnostics();
    playground.shutdown();

    let metadata = RenderMetadata {
        job: spec.clone(),
        started_at,
        completed_at: Utc::now(),
        render_duration_secs: clock.elapsed().as_secs_f64(),
        frame_count: spec.frames,
        script_hash,
        codeplay_version: env!("CARGO_PKG_VERSION").to_string(),
        width,
        height,
        entities,
        script_completed: matches!(outcome, ExecutionOutcome::Completed),
        diagnostics,
        console,
        warnings,
    };

    if spec.save_frames {
        metadata
            .save(&spec.output_dir.join("metadata.json"))
            .map_err(|e| RenderError::new(RenderPhase::MetadataSave, e))?;
    }
    Ok(metadata)
}

/// Select the mode, run the script and render every frame.
fn drive(
    playground: &mut Playground<ManualScheduler>,
    spec: &RenderJobSpec,
    source: &str,
    clock: &Instant,
    on_progress: &mut dyn FnMut(&RenderProgress),
) -> Result<ExecutionOutcome, RenderError> {
    playground.select_mode(spec.mode).map_err(|e| {
        RenderError::with_source(RenderPhase::Initialization, "Failed to select mode", e)
    })?;
    if spec.trails {
        playground.set_trails(true);
    }

    let outcome = playground
        .execute_code(source)
        .map_err(|e| RenderError::with_source(RenderPhase::ScriptLoading, "Failed to run script", e))?;
    if let ExecutionOutcome::Failed(diagnostic) = &outcome {
        log::warn!("Script failed, rendering partial state: {}", diagnostic.message);
    }

    log::info!("Rendering {} frames to {:?}", spec.frames, spec.output_dir);
    for index in 0..spec.frames {
        playground.advance_frame();

        if spec.save_frames {
            let image = playground.snapshot_image().ok_or_else(|| {
                RenderError::new(
                    RenderPhase::FrameRender,
                    format!("Frame {} has no pixels to save", index),
                )
            })?;
            let path = spec.frame_path(index);
            image.save(&path).map_err(|e| {
                RenderError::with_source(
                    RenderPhase::FrameSave,
                    format!("Failed to save {:?}", path),
                    e,
                )
            })?;
        }

        on_progress(&RenderProgress {
            current_frame: index + 1,
            total_frames: spec.frames,
            elapsed_secs: clock.elapsed().as_secs_f64(),
        });
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("codeplay_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_script(dir: &Path, source: &str) -> PathBuf {
        let path = dir.join("script.rhai");
        std::fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_render_job_spec_validation() {
        let spec = RenderJobSpec::new(
            PathBuf::from("/nonexistent/script.rhai"),
            Mode::Snake,
            PathBuf::from("/output"),
        );

        // Should fail because the script doesn't exist
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_render_job_spec_defaults() {
        let spec: RenderJobSpec = serde_json::from_str(
            r#"{"scriptPath": "a.rhai", "mode": "drawing", "outputDir": "out"}"#,
        )
        .unwrap();

        assert_eq!(spec.mode, Mode::Drawing);
        assert_eq!(spec.frames, 120);
        assert!(spec.save_frames);
        assert!(!spec.trails);
        assert_eq!(spec.frame_path(7), PathBuf::from("out").join("frame_00007.png"));
    }

    #[test]
    fn test_seed_overrides_config() {
        let mut spec = RenderJobSpec::new(PathBuf::from("a.rhai"), Mode::Drawing, PathBuf::from("out"));
        spec.seed = Some(42);
        assert_eq!(spec.load_config().unwrap().particle_seed, 42);
    }

    #[test]
    fn test_render_progress_percentage() {
        let progress = RenderProgress {
            current_frame: 50,
            total_frames: 100,
            elapsed_secs: 5.0,
        };

        assert_eq!(progress.percentage(), 50.0);
    }

    #[test]
    fn test_render_error_display_includes_phase() {
        let err = RenderError::new(RenderPhase::FrameSave, "disk full");
        assert_eq!(err.to_string(), "[Frame Save] disk full");
    }

    #[test]
    fn test_hash_file_is_sha256() {
        let dir = scratch_dir("hash");
        let path = dir.join("empty.rhai");
        std::fs::write(&path, "").unwrap();
        assert_eq!(
            RenderMetadata::hash_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_run_job_writes_frames_and_metadata() {
        let dir = scratch_dir("render");
        let script = write_script(&dir, "let b = BouncingBall(200, 100, 15);\nprint(\"ready\");\n");
        let mut spec = RenderJobSpec::new(script, Mode::Ball, dir.join("out"));
        spec.frames = 3;

        let mut reported = Vec::new();
        let metadata = run_job(&spec, |p| reported.push(p.current_frame)).unwrap();

        assert_eq!(reported, vec![1, 2, 3]);
        assert!(metadata.script_completed);
        assert_eq!(metadata.entities.balls, 1);
        assert_eq!((metadata.width, metadata.height), (400, 400));
        assert_eq!(metadata.console.last().map(|e| e.message.as_str()), Some("ready"));
        for index in 0..3 {
            assert!(spec.frame_path(index).exists());
        }
        assert!(spec.output_dir.join("metadata.json").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_run_job_keeps_partial_state_on_script_error() {
        let dir = scratch_dir("partial");
        let script = write_script(&dir, "Circle(10, 10, 5);\nCircle(1, 2);\n");
        let mut spec = RenderJobSpec::new(script, Mode::Drawing, dir.join("out"));
        spec.frames = 1;
        spec.save_frames = false;

        let metadata = run_job(&spec, |_| {}).unwrap();
        assert!(!metadata.script_completed);
        assert_eq!(metadata.entities.shapes, 1);
        assert_eq!(metadata.warnings.len(), 1);
        assert!(metadata.warnings[0].starts_with("Execution Error:"));
        assert!(!spec.output_dir.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_mode_selection_releases_console() {
        let dir = scratch_dir("init_fail");
        let script = write_script(&dir, "Circle(10, 10, 5);\n");
        let config = dir.join("config.json");
        std::fs::write(&config, r#"{"drawingWidth": 0}"#).unwrap();
        let mut spec = RenderJobSpec::new(script, Mode::Drawing, dir.join("out"));
        spec.config_path = Some(config);
        spec.save_frames = false;

        let err = run_job(&spec, |_| {}).unwrap_err();
        assert_eq!(err.phase, RenderPhase::Initialization);
        assert!(!crate::console::has_active_sink());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
