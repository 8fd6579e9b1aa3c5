//! Rhai execution host.
//!
//! Every call to [`ScriptHost::execute_code`] builds a fresh engine that only
//! knows the constructors of one mode. Those constructors are bound to the
//! mode's registry, so whatever a script creates is simulated without the
//! script having to register anything itself. Nothing registered here
//! survives the call.
//!
//! Available API (see `script_api` for the full listing):
//! - game: `Snake(x, y)`, `BouncingBall(x, y, radius)`
//! - drawing: `Circle`, `Rectangle`, `Triangle`, `Particle`
//! - both: `print(value)`, `debug(value)`, `warn(value)`, `error(value)`

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rhai::{Dynamic, Engine, Scope};

use crate::console::{ConsoleSink, Severity};
use crate::drawing::DrawingSimulation;
use crate::drawing_rhai::register_drawing_api;
use crate::game_rhai::register_game_api;
use crate::playground::LoopKind;
use crate::script_diagnostics::{from_eval_error, from_parse_error, ScriptDiagnostic};
use crate::script_log::{emit_log, stringify_dynamic};
use crate::simulation::{EntityRegistry, Simulation};

/// Oldest diagnostics are dropped beyond this many.
const MAX_DIAGNOSTICS: usize = 32;

/// The registry a script run populates, which also decides what the
/// script can construct.
#[derive(Clone)]
pub enum CapabilitySurface {
    Game(Rc<RefCell<Simulation>>),
    Drawing(Rc<RefCell<DrawingSimulation>>),
}

impl CapabilitySurface {
    pub fn kind(&self) -> LoopKind {
        match self {
            CapabilitySurface::Game(_) => LoopKind::Game,
            CapabilitySurface::Drawing(_) => LoopKind::Drawing,
        }
    }

    /// Game runs start from an empty console; drawing runs keep it.
    pub fn clears_console(&self) -> bool {
        matches!(self, CapabilitySurface::Game(_))
    }

    fn reset(&self) {
        match self {
            CapabilitySurface::Game(sim) => sim.borrow_mut().reset(),
            CapabilitySurface::Drawing(sim) => sim.borrow_mut().reset(),
        }
    }

    fn install(&self, engine: &mut Engine) {
        match self {
            CapabilitySurface::Game(sim) => register_game_api(engine, Rc::clone(sim)),
            CapabilitySurface::Drawing(sim) => register_drawing_api(engine, Rc::clone(sim)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// Same text as the previous run for this loop kind; nothing happened.
    Skipped,
    Completed,
    /// The error was reported to the console. Entities created before it
    /// stay registered.
    Failed(ScriptDiagnostic),
}

impl ExecutionOutcome {
    pub fn ran(&self) -> bool {
        !matches!(self, ExecutionOutcome::Skipped)
    }
}

pub struct ScriptHost {
    console: ConsoleSink,
    /// 0 disables the operation limit.
    max_operations: u64,
    last_source: HashMap<LoopKind, String>,
    diagnostics: Vec<ScriptDiagnostic>,
}

impl ScriptHost {
    pub fn new(console: ConsoleSink, max_operations: u64) -> Self {
        Self {
            console,
            max_operations,
            last_source: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Run `source` against `surface`, unless it is exactly the text last
    /// run for the same loop kind.
    pub fn execute_code(&mut self, source: &str, surface: &CapabilitySurface) -> ExecutionOutcome {
        let kind = surface.kind();
        if self.last_source.get(&kind).is_some_and(|last| last == source) {
            log::debug!("Script unchanged for {:?} loop, skipping", kind);
            return ExecutionOutcome::Skipped;
        }
        self.last_source.insert(kind, source.to_string());

        surface.reset();
        if surface.clears_console() {
            self.console.clear();
        }

        let engine = self.build_engine(surface);
        let result = match engine.compile(source) {
            Ok(ast) => {
                let mut scope = Scope::new();
                engine
                    .run_ast_with_scope(&mut scope, &ast)
                    .map_err(|e| from_eval_error(&e))
            }
            Err(e) => Err(from_parse_error(&e)),
        };

        match result {
            Ok(()) => {
                log::info!("Script executed ({:?} loop)", kind);
                ExecutionOutcome::Completed
            }
            Err(diag) => {
                let message = diag.console_message();
                log::error!(target: "script", "{}", message);
                self.console.record(Severity::Error, message);
                self.push_diagnostic(diag.clone());
                ExecutionOutcome::Failed(diag)
            }
        }
    }

    /// Forget the last text run for `kind` so the next call runs regardless.
    pub fn forget(&mut self, kind: LoopKind) {
        self.last_source.remove(&kind);
    }

    pub fn last_source(&self, kind: LoopKind) -> Option<&str> {
        self.last_source.get(&kind).map(String::as_str)
    }

    /// Drain and return all pending diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<ScriptDiagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn push_diagnostic(&mut self, diag: ScriptDiagnostic) {
        self.diagnostics.push(diag);
        if self.diagnostics.len() > MAX_DIAGNOSTICS {
            let excess = self.diagnostics.len() - MAX_DIAGNOSTICS;
            self.diagnostics.drain(0..excess);
        }
    }

    fn build_engine(&self, surface: &CapabilitySurface) -> Engine {
        let mut engine = Engine::new();

        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(64);
        if self.max_operations > 0 {
            engine.set_max_operations(self.max_operations);
        }
        engine.disable_symbol("eval");

        engine.on_print(|text| emit_log(Severity::Info, text));
        engine.on_debug(|text, _source, _pos| emit_log(Severity::Info, text));
        engine
            .register_fn("warn", |value: Dynamic| {
                emit_log(Severity::Warn, &stringify_dynamic(&value));
            })
            .register_fn("error", |value: Dynamic| {
                emit_log(Severity::Error, &stringify_dynamic(&value));
            });

        surface.install(&mut engine);
        engine
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::color::Rgba;

    struct Fixture {
        host: ScriptHost,
        console: ConsoleSink,
        game: Rc<RefCell<Simulation>>,
        drawing: Rc<RefCell<DrawingSimulation>>,
    }

    impl Fixture {
        fn new() -> Self {
            let console = ConsoleSink::install(50);
            Self {
                host: ScriptHost::new(console.clone(), 0),
                console,
                game: Rc::new(RefCell::new(Simulation::default())),
                drawing: Rc::new(RefCell::new(DrawingSimulation::new(1200, 600, Rgba::WHITE, 3))),
            }
        }

        fn game(&self) -> CapabilitySurface {
            CapabilitySurface::Game(Rc::clone(&self.game))
        }

        fn drawing(&self) -> CapabilitySurface {
            CapabilitySurface::Drawing(Rc::clone(&self.drawing))
        }

        fn messages(&self) -> Vec<String> {
            self.console.snapshot().into_iter().map(|e| e.message).collect()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            self.console.teardown();
        }
    }

    #[test]
    fn test_snake_moves_after_one_tick() {
        let mut fx = Fixture::new();
        let surface = fx.game();
        let outcome = fx
            .host
            .execute_code(r#"let s = Snake(200, 200); s.setSpeed(3); s.move("right");"#, &surface);
        assert!(matches!(outcome, ExecutionOutcome::Completed));

        fx.game.borrow_mut().update(Vec2::splat(400.0));
        assert_eq!(fx.game.borrow().snakes()[0].borrow().position, Vec2::new(203.0, 200.0));
    }

    #[test]
    fn test_identical_text_runs_once() {
        let mut fx = Fixture::new();
        let surface = fx.game();
        let script = r#"print("hello"); Snake(10, 10);"#;

        assert!(fx.host.execute_code(script, &surface).ran());
        assert!(!fx.host.execute_code(script, &surface).ran());

        assert_eq!(fx.messages(), vec!["hello"]);
        assert_eq!(fx.game.borrow().snakes().len(), 1);
    }

    #[test]
    fn test_second_script_replaces_entities() {
        let mut fx = Fixture::new();
        let surface = fx.game();
        fx.host.execute_code("Snake(1, 1); Snake(2, 2);", &surface);
        fx.host.execute_code("BouncingBall(50, 50, 5);", &surface);

        let sim = fx.game.borrow();
        assert!(sim.snakes().is_empty());
        assert_eq!(sim.balls().len(), 1);
    }

    #[test]
    fn test_error_is_reported_and_partial_state_kept() {
        let mut fx = Fixture::new();
        let surface = fx.game();
        let outcome = fx.host.execute_code(r#"Snake(1, 1); throw "broken"; Snake(2, 2);"#, &surface);

        assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
        assert_eq!(fx.game.borrow().snakes().len(), 1);

        let entries = fx.console.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert!(entries[0].message.starts_with("Execution Error: "));
        assert!(entries[0].message.contains("broken"));
        assert_eq!(fx.host.take_diagnostics().len(), 1);
        assert!(fx.host.take_diagnostics().is_empty());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut fx = Fixture::new();
        let surface = fx.drawing();
        let outcome = fx.host.execute_code("let = ;", &surface);
        assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
        assert!(fx.messages()[0].starts_with("Execution Error: "));
    }

    #[test]
    fn test_console_policy_per_mode() {
        let mut fx = Fixture::new();
        let game = fx.game();
        let drawing = fx.drawing();

        fx.host.execute_code(r#"print("one");"#, &drawing);
        fx.host.execute_code(r#"print("two");"#, &drawing);
        assert_eq!(fx.messages(), vec!["one", "two"]);

        fx.host.execute_code(r#"warn("three");"#, &game);
        assert_eq!(fx.messages(), vec!["three"]);
        assert_eq!(fx.console.snapshot()[0].severity, Severity::Warn);
    }

    #[test]
    fn test_capabilities_are_mode_specific() {
        let mut fx = Fixture::new();
        let drawing = fx.drawing();
        let outcome = fx.host.execute_code("Snake(1, 1);", &drawing);
        assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
        assert!(fx.game.borrow().is_empty());

        let game = fx.game();
        let outcome = fx.host.execute_code("Circle(1, 1, 5);", &game);
        assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
        assert!(fx.drawing.borrow().shapes().is_empty());
    }

    #[test]
    fn test_eval_is_disabled() {
        let mut fx = Fixture::new();
        let game = fx.game();
        let outcome = fx.host.execute_code(r#"eval("Snake(1, 1)");"#, &game);
        assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
        assert!(fx.game.borrow().is_empty());
    }

    #[test]
    fn test_forget_allows_rerun() {
        let mut fx = Fixture::new();
        let game = fx.game();
        fx.host.execute_code("Snake(1, 1);", &game);
        fx.host.forget(LoopKind::Game);
        assert!(fx.host.last_source(LoopKind::Game).is_none());
        assert!(fx.host.execute_code("Snake(1, 1);", &game).ran());
    }

    #[test]
    fn test_operation_limit_stops_runaway_loop() {
        let console = ConsoleSink::install(50);
        let mut host = ScriptHost::new(console.clone(), 10_000);
        let sim = Rc::new(RefCell::new(Simulation::default()));
        let outcome = host.execute_code("loop { }", &CapabilitySurface::Game(sim));
        assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
        console.teardown();
    }
}
