//! Conversions between script values and engine data.

use std::collections::BTreeMap;

use courier_application::ports::ScriptExecutionError;
use courier_domain::ScriptKind;
use rhai::{Dynamic, EvalAltResult, Map, ParseError, Position};

/// Lines the sandbox inserts before the script body. Scripts are compiled
/// as-is, so interpreter lines map one-to-one onto script lines.
pub const PROLOGUE_LINES: usize = 0;

/// Builds a runtime error raised from a native binding.
pub fn runtime_error(message: impl Into<String>) -> Box<EvalAltResult> {
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from(message.into()),
        Position::NONE,
    ))
}

/// Renders a script value the way it is stored in a variable or printed to
/// the console: strings verbatim, `()` as empty, maps and arrays as JSON.
pub fn stringify(value: &Dynamic) -> String {
    if value.is_string() {
        return value.clone().into_string().unwrap_or_default();
    }
    if value.is_unit() {
        return String::new();
    }
    if (value.is_map() || value.is_array())
        && let Ok(json) = rhai::serde::from_dynamic::<serde_json::Value>(value)
    {
        return json.to_string();
    }
    value.to_string()
}

/// Converts a string map into a script object map.
pub fn to_script_map(entries: BTreeMap<String, String>) -> Map {
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), Dynamic::from(v)))
        .collect()
}

/// Returns `Some(text)` as a string value and `None` as `()`.
pub fn optional_string(value: Option<String>) -> Dynamic {
    value.map_or(Dynamic::UNIT, Dynamic::from)
}

/// Converts an engine integer, saturating at the script integer range.
pub fn to_int<T: TryInto<rhai::INT>>(value: T) -> rhai::INT {
    value.try_into().unwrap_or(rhai::INT::MAX)
}

fn script_line(position: Position) -> Option<usize> {
    position
        .line()
        .and_then(|line| line.checked_sub(PROLOGUE_LINES))
        .filter(|line| *line > 0)
}

/// Maps a compile failure to a script error.
pub fn from_parse_error(error: &ParseError, phase: ScriptKind, owner: &str) -> ScriptExecutionError {
    ScriptExecutionError::new(phase, owner, error.err_type().to_string())
        .at_line(script_line(error.position()))
}

/// Maps a runtime failure to a script error.
///
/// The message of a thrown value is the value itself; anything else uses
/// the interpreter's description without its position suffix.
pub fn from_eval_error(
    error: Box<EvalAltResult>,
    phase: ScriptKind,
    owner: &str,
) -> ScriptExecutionError {
    let mut error = *error;
    let position = error.take_position();
    let message = match error {
        EvalAltResult::ErrorRuntime(value, _) => thrown_message(&value),
        EvalAltResult::ErrorInFunctionCall(name, _, inner, _) => {
            format!("in '{name}': {}", describe(*inner))
        }
        other => other.to_string(),
    };
    ScriptExecutionError::new(phase, owner, message).at_line(script_line(position))
}

fn describe(mut error: EvalAltResult) -> String {
    if let EvalAltResult::ErrorRuntime(value, _) = &error {
        return thrown_message(value);
    }
    let _position = error.take_position();
    error.to_string()
}

fn thrown_message(value: &Dynamic) -> String {
    if let Some(map) = value.read_lock::<Map>()
        && let Some(message) = map.get("message")
    {
        return stringify(message);
    }
    stringify(value)
}
