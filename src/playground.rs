//! The playground: one console, two simulations, one active loop.
//!
//! A [`Playground`] is in exactly one of three loop states. Selecting a mode
//! always stops whatever loop is running before the new one starts, so the
//! game loop and the drawing loop never tick together.
//!
//! ```text
//!            select(snake|ball)            select(drawing)
//! Inactive ───────────────────▶ Game ◀──────────────────▶ Drawing
//!     ▲                          │                          │
//!     └──────── shutdown ────────┴───────── shutdown ───────┘
//! ```

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::resolve_color;
use crate::config::PlaygroundConfig;
use crate::console::{ConsoleEntry, ConsoleSink};
use crate::drawing::DrawingSimulation;
use crate::scheduler::{FrameScheduler, FrameToken, GameLoop, ManualScheduler};
use crate::script_diagnostics::ScriptDiagnostic;
use crate::script_host::{CapabilitySurface, ExecutionOutcome, ScriptHost};
use crate::simulation::Simulation;
use crate::surface::{Surface, SurfaceProvider};

/// Engine-level failures. Script errors never show up here; they go to
/// the console.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A surface or other host dependency was unavailable.
    Initialization { message: String },
    UnknownMode(String),
    /// An operation needed a selected mode and none is active.
    NoActiveMode,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Initialization { message } => write!(f, "Initialization failed: {}", message),
            EngineError::UnknownMode(mode) => {
                write!(f, "Unknown mode '{}' (expected snake, ball or drawing)", mode)
            }
            EngineError::NoActiveMode => write!(f, "No mode is active"),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Snake,
    Ball,
    Drawing,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Snake, Mode::Ball, Mode::Drawing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Snake => "snake",
            Mode::Ball => "ball",
            Mode::Drawing => "drawing",
        }
    }

    pub fn loop_kind(&self) -> LoopKind {
        match self {
            Mode::Snake | Mode::Ball => LoopKind::Game,
            Mode::Drawing => LoopKind::Drawing,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snake" => Ok(Mode::Snake),
            "ball" => Ok(Mode::Ball),
            "drawing" => Ok(Mode::Drawing),
            _ => Err(EngineError::UnknownMode(s.to_string())),
        }
    }
}

/// Which of the two render loops a mode runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    Game,
    Drawing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Inactive,
    Game,
    Drawing,
}

pub struct Playground<S: FrameScheduler> {
    config: PlaygroundConfig,
    scheduler: S,
    provider: Box<dyn SurfaceProvider>,
    console: ConsoleSink,
    host: ScriptHost,
    simulation: Rc<RefCell<Simulation>>,
    drawing: Rc<RefCell<DrawingSimulation>>,
    game_loop: GameLoop,
    /// Owned by the game loop while it runs.
    game_surface: Option<Box<dyn Surface>>,
    mode: Option<Mode>,
    /// Game mode selected most recently, kept across drawing detours.
    last_game_mode: Option<Mode>,
    state: LoopState,
    shut_down: bool,
}

impl<S: FrameScheduler> Playground<S> {
    /// Create a playground and install its console on this thread.
    pub fn new(config: PlaygroundConfig, scheduler: S, provider: Box<dyn SurfaceProvider>) -> Self {
        let console = ConsoleSink::install(config.console_capacity);
        let host = ScriptHost::new(console.clone(), config.max_operations);
        let simulation = Simulation::new(config.game_style());
        let drawing = DrawingSimulation::new(
            config.drawing_width,
            config.drawing_height,
            resolve_color(&config.drawing_background),
            config.particle_seed,
        );

        Self {
            config,
            scheduler,
            provider,
            console,
            host,
            simulation: Rc::new(RefCell::new(simulation)),
            drawing: Rc::new(RefCell::new(drawing)),
            game_loop: GameLoop::new(),
            game_surface: None,
            mode: None,
            last_game_mode: None,
            state: LoopState::Inactive,
            shut_down: false,
        }
    }

    /// Switch to `mode`, stopping the current loop first.
    ///
    /// Selecting the mode that is already running does nothing. On failure
    /// the playground is left inactive.
    pub fn select_mode(&mut self, mode: Mode) -> Result<(), EngineError> {
        if self.shut_down {
            return Err(EngineError::Initialization {
                message: "playground has been shut down".to_string(),
            });
        }
        if self.mode == Some(mode) && self.state != LoopState::Inactive {
            return Ok(());
        }

        self.mode = None;
        self.stop_active();

        // Snake and ball share a registry; a switch between them, even with
        // drawing mode in between, must not let the old mode's text count
        // as already executed.
        if mode.loop_kind() == LoopKind::Game {
            if self.last_game_mode.is_some_and(|last| last != mode) {
                self.host.forget(LoopKind::Game);
            }
            self.last_game_mode = Some(mode);
        }

        match mode.loop_kind() {
            LoopKind::Game => {
                let surface = self
                    .provider
                    .create_surface(self.config.game_width, self.config.game_height)
                    .map_err(|e| {
                        log::error!("Cannot start game loop: {}", e);
                        e
                    })?;
                self.game_surface = Some(surface);
                self.game_loop.start(&mut self.scheduler);
                self.state = LoopState::Game;
            }
            LoopKind::Drawing => {
                self.drawing.borrow_mut().initialize(&mut *self.provider)?;
                self.state = LoopState::Drawing;
            }
        }

        self.mode = Some(mode);
        log::info!("Mode selected: {}", mode);
        Ok(())
    }

    /// Run script text against the active mode.
    pub fn execute_code(&mut self, source: &str) -> Result<ExecutionOutcome, EngineError> {
        let surface = match self.state {
            LoopState::Game => CapabilitySurface::Game(Rc::clone(&self.simulation)),
            LoopState::Drawing => CapabilitySurface::Drawing(Rc::clone(&self.drawing)),
            LoopState::Inactive => return Err(EngineError::NoActiveMode),
        };
        Ok(self.host.execute_code(source, &surface))
    }

    /// Frame callback for the game loop. Returns whether a tick ran.
    pub fn on_frame(&mut self, token: FrameToken) -> bool {
        if self.state != LoopState::Game {
            return false;
        }
        let Some(surface) = self.game_surface.as_deref_mut() else {
            return false;
        };
        let simulation = &self.simulation;
        self.game_loop
            .on_frame(token, &mut self.scheduler, || simulation.borrow_mut().tick(surface))
    }

    /// Frame callback for the drawing loop. Returns whether a frame was drawn.
    pub fn drawing_frame(&mut self) -> bool {
        if self.state != LoopState::Drawing {
            return false;
        }
        self.drawing.borrow_mut().draw_frame()
    }

    pub fn set_trails(&mut self, enabled: bool) {
        self.drawing.borrow_mut().set_trails(enabled);
    }

    pub fn clear_console(&self) {
        self.console.clear();
    }

    pub fn console_entries(&self) -> Vec<ConsoleEntry> {
        self.console.snapshot()
    }

    pub fn console(&self) -> &ConsoleSink {
        &self.console
    }

    pub fn set_console_observer(&self, observer: impl FnMut(&[ConsoleEntry]) + 'static) {
        self.console.set_observer(observer);
    }

    pub fn take_diagnostics(&mut self) -> Vec<ScriptDiagnostic> {
        self.host.take_diagnostics()
    }

    /// Stop the active loop, release surfaces and uninstall the console.
    /// Only the first call has any effect.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.stop_active();
        self.mode = None;
        self.console.teardown();
        self.shut_down = true;
        log::info!("Playground shut down");
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn loop_state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn simulation(&self) -> Ref<'_, Simulation> {
        self.simulation.borrow()
    }

    pub fn drawing(&self) -> Ref<'_, DrawingSimulation> {
        self.drawing.borrow()
    }

    pub fn game_frames(&self) -> u64 {
        self.game_loop.frames()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Pixels of the active loop's surface, if its backend has any.
    pub fn snapshot_image(&self) -> Option<image::RgbaImage> {
        match self.state {
            LoopState::Game => self.game_surface.as_ref().and_then(|s| s.to_image()),
            LoopState::Drawing => self.drawing.borrow().surface().and_then(|s| s.to_image()),
            LoopState::Inactive => None,
        }
    }

    fn stop_active(&mut self) {
        match self.state {
            LoopState::Game => {
                self.game_loop.stop(&mut self.scheduler);
                self.game_surface = None;
            }
            LoopState::Drawing => self.drawing.borrow_mut().teardown(),
            LoopState::Inactive => {}
        }
        self.state = LoopState::Inactive;
    }
}

impl Playground<ManualScheduler> {
    /// Headless convenience: fire every due game frame, then one drawing
    /// frame. Returns how many ticks ran.
    pub fn advance_frame(&mut self) -> usize {
        let mut ticks = 0;
        for token in self.scheduler.take_due() {
            if self.on_frame(token) {
                ticks += 1;
            }
        }
        if self.drawing_frame() {
            ticks += 1;
        }
        ticks
    }
}
