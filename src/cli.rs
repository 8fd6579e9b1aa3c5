use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::PlaygroundConfig;
use crate::console::ConsoleEntry;
use crate::playground::{Mode, Playground};
use crate::presets::{default_script, DRAWING_EXAMPLES};
use crate::render_job::{run_job, RenderJobSpec};
use crate::scheduler::ManualScheduler;
use crate::script_api::script_api_metadata_json;
use crate::script_diagnostics::ScriptDiagnostic;
use crate::script_host::ExecutionOutcome;
use crate::surface::{DrawCommand, RecordingProvider};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script headlessly and render frames to disk
    Render {
        /// Rhai script to execute
        #[arg(long)]
        script: PathBuf,

        /// snake, ball or drawing
        #[arg(long)]
        mode: Mode,

        /// Output directory for frames and metadata.json
        #[arg(long)]
        out: PathBuf,

        /// Number of frames to render
        #[arg(long, default_value_t = 120)]
        frames: usize,

        /// Keep previous frames on the drawing surface
        #[arg(long)]
        trails: bool,

        /// Particle seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Playground config JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip writing PNG frames
        #[arg(long)]
        no_frames: bool,
    },

    /// Execute a script once and print console output and diagnostics as JSON
    Check {
        #[arg(long)]
        script: PathBuf,

        #[arg(long)]
        mode: Mode,

        /// Also render one frame and include its draw commands
        #[arg(long)]
        frame: bool,
    },

    /// Print the script API available in a mode as JSON
    Api {
        #[arg(long, default_value = "drawing")]
        mode: Mode,
    },

    /// Print a starter script
    Preset {
        #[arg(long)]
        mode: Mode,

        /// Drawing example to print
        #[arg(long)]
        index: Option<usize>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    mode: Mode,
    status: &'static str,
    console: Vec<ConsoleEntry>,
    diagnostics: Vec<ScriptDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<Vec<DrawCommand>>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { script, mode, out, frames, trails, seed, config, no_frames } => {
            let mut spec = RenderJobSpec::new(script, mode, out);
            spec.frames = frames;
            spec.trails = trails;
            spec.seed = seed;
            spec.config_path = config;
            spec.save_frames = !no_frames;
            render(&spec)?;
        }
        Commands::Check { script, mode, frame } => check(script, mode, frame)?,
        Commands::Api { mode } => println!("{}", script_api_metadata_json(mode)),
        Commands::Preset { mode, index } => println!("{}", preset(mode, index)?),
    }
    Ok(())
}

fn render(spec: &RenderJobSpec) -> Result<()> {
    let metadata = run_job(spec, |progress| {
        if progress.current_frame % 30 == 0 || progress.current_frame == progress.total_frames {
            log::info!(
                "Frame {}/{} ({:.0}%)",
                progress.current_frame,
                progress.total_frames,
                progress.percentage()
            );
        }
    })?;

    for entry in &metadata.console {
        println!("[{}] {}", entry.severity.label(), entry.message);
    }
    println!(
        "Rendered {} frames in {:.2}s",
        metadata.frame_count, metadata.render_duration_secs
    );
    if spec.save_frames {
        println!("Output written to {:?}", spec.output_dir);
    }
    Ok(())
}

fn check(script: PathBuf, mode: Mode, render_frame: bool) -> Result<()> {
    let source = std::fs::read_to_string(&script)
        .with_context(|| format!("Failed to read script {:?}", script))?;

    let provider = RecordingProvider::new();
    let commands = Rc::clone(&provider.log);
    let mut playground =
        Playground::new(PlaygroundConfig::default(), ManualScheduler::new(), Box::new(provider));
    playground.select_mode(mode)?;
    let outcome = playground.execute_code(&source)?;

    let frame = render_frame.then(|| {
        commands.borrow_mut().clear();
        playground.advance_frame();
        commands.borrow().clone()
    });

    let report = CheckReport {
        mode,
        status: match outcome {
            ExecutionOutcome::Completed => "completed",
            ExecutionOutcome::Failed(_) => "failed",
            ExecutionOutcome::Skipped => "skipped",
        },
        console: playground.console_entries(),
        diagnostics: playground.take_diagnostics(),
        frame,
    };
    playground.shutdown();

    println!("{}", serde_json::to_string_pretty(&report)?);
    if let ExecutionOutcome::Failed(diagnostic) = outcome {
        anyhow::bail!("{}", diagnostic.console_message());
    }
    Ok(())
}

fn preset(mode: Mode, index: Option<usize>) -> Result<&'static str> {
    match (mode, index) {
        (Mode::Drawing, Some(i)) => DRAWING_EXAMPLES
            .get(i)
            .map(|p| p.source)
            .with_context(|| {
                format!("No drawing example {} (have {})", i, DRAWING_EXAMPLES.len())
            }),
        _ => Ok(default_script(mode)),
    }
}
