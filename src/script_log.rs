//! Print-style output from scripts and the engine.
//!
//! Every message goes to the `log` facade and, when one is installed on the
//! current thread, to the active [`ConsoleSink`](crate::console::ConsoleSink).
//! Scripts reach this through `print`, `debug`, `warn` and `error`.

use crate::console::{with_active_sink, Severity};

/// Emit a message at the given severity.
pub fn emit_log(level: Severity, message: &str) {
    match level {
        Severity::Info => log::info!(target: "script", "{}", message),
        Severity::Warn => log::warn!(target: "script", "{}", message),
        Severity::Error => log::error!(target: "script", "{}", message),
    }
    with_active_sink(|sink| sink.record(level, message));
}

/// Convert a Rhai Dynamic value to a string safely.
/// Never panics, handles all types gracefully.
pub fn stringify_dynamic(value: &rhai::Dynamic) -> String {
    if let Ok(s) = value.clone().into_string() {
        return s;
    }

    if value.is_array() {
        if let Some(arr) = value.clone().try_cast::<rhai::Array>() {
            let parts: Vec<String> = arr.iter().map(stringify_dynamic).collect();
            return parts.join(" ");
        }
    }

    if value.is_map() {
        if let Some(map) = value.clone().try_cast::<rhai::Map>() {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, stringify_dynamic(v)))
                .collect();
            return format!("{{{}}}", parts.join(", "));
        }
    }

    if let Ok(i) = value.as_int() {
        return i.to_string();
    }

    if let Ok(f) = value.as_float() {
        return format!("{}", f);
    }

    if let Ok(b) = value.as_bool() {
        return b.to_string();
    }

    if value.is_unit() {
        return "()".to_string();
    }

    // Fallback: Dynamic's own formatting (type name for custom types)
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ConsoleSink;

    #[test]
    fn test_stringify_string() {
        let value = rhai::Dynamic::from("hello");
        assert_eq!(stringify_dynamic(&value), "hello");
    }

    #[test]
    fn test_stringify_numbers_and_bools() {
        assert_eq!(stringify_dynamic(&rhai::Dynamic::from(42_i64)), "42");
        assert_eq!(stringify_dynamic(&rhai::Dynamic::from(3.5_f32)), "3.5");
        assert_eq!(stringify_dynamic(&rhai::Dynamic::from(true)), "true");
        assert_eq!(stringify_dynamic(&rhai::Dynamic::UNIT), "()");
    }

    #[test]
    fn test_stringify_array() {
        let mut arr = rhai::Array::new();
        arr.push(rhai::Dynamic::from("speed"));
        arr.push(rhai::Dynamic::from(0.5_f32));
        let value = rhai::Dynamic::from(arr);
        assert_eq!(stringify_dynamic(&value), "speed 0.5");
    }

    #[test]
    fn test_emit_reaches_installed_sink() {
        let sink = ConsoleSink::install(10);
        emit_log(Severity::Warn, "careful");
        sink.teardown();
        emit_log(Severity::Info, "not captured");

        let entries = sink.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Warn);
        assert_eq!(entries[0].message, "careful");
    }
}
