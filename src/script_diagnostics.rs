//! Structured script diagnostics.
//!
//! Rhai errors carry positions; a failed execution is wrapped into a stable,
//! JSON-serializable record so tools (the `check` command, an editor) can
//! show it without scraping log output.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptDiagnosticKind {
    /// Syntax errors, reported before anything runs.
    ParseError,
    /// Errors raised while the script body runs.
    RuntimeError,
    /// The script used the capability surface incorrectly (unknown
    /// constructor, wrong argument types, missing property).
    HostApiMisuse,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    Compile,
    Run,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScriptLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptDiagnostic {
    pub kind: ScriptDiagnosticKind,
    pub phase: ScriptPhase,
    pub message: String,
    pub location: Option<ScriptLocation>,
}

impl ScriptDiagnostic {
    /// The line recorded in the console for this failure.
    pub fn console_message(&self) -> String {
        format!("Execution Error: {}", self.message)
    }
}

fn classify_message(message: &str) -> ScriptDiagnosticKind {
    // Rhai error strings are stable enough to classify without matching
    // on its internal enum variants.
    let lower = message.to_ascii_lowercase();

    if lower.contains("property not found")
        || lower.contains("variable not found")
        || lower.contains("function not found")
        || lower.contains("expected number")
        || lower.contains("mismatched types")
    {
        return ScriptDiagnosticKind::HostApiMisuse;
    }

    ScriptDiagnosticKind::RuntimeError
}

fn location_of(pos: rhai::Position) -> Option<ScriptLocation> {
    let line = pos.line()? as u32;
    if line == 0 {
        return None;
    }
    Some(ScriptLocation {
        line,
        column: (pos.position().unwrap_or(0) as u32).max(1),
    })
}

pub fn from_parse_error(err: &rhai::ParseError) -> ScriptDiagnostic {
    ScriptDiagnostic {
        kind: ScriptDiagnosticKind::ParseError,
        phase: ScriptPhase::Compile,
        message: err.to_string(),
        location: location_of(err.position()),
    }
}

pub fn from_eval_error(err: &rhai::EvalAltResult) -> ScriptDiagnostic {
    let message = err.to_string();
    ScriptDiagnostic {
        kind: classify_message(&message),
        phase: ScriptPhase::Run,
        message,
        location: location_of(err.position()),
    }
}
