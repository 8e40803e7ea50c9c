//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use courier_domain::{LogEntry, ResponseSpec, VariableMap};

/// Renders a response: status line, headers, blank line, body.
pub fn render_response(response: &ResponseSpec) -> String {
    let mut out = String::new();
    if response.is_transport_error() {
        let _ = writeln!(out, "{} ({})", response.status_text, response.body);
        return out;
    }
    let _ = writeln!(
        out,
        "{} {}  {}  {} bytes",
        response.status,
        response.status_text,
        response.duration_display(),
        response.size
    );
    for (name, value) in &response.headers {
        let _ = writeln!(out, "{name}: {value}");
    }
    out.push('\n');
    out.push_str(&response.body);
    if !response.body.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Renders console entries, one per line, prefixed by level.
pub fn render_console(entries: &[LogEntry]) -> String {
    entries.iter().fold(String::new(), |mut out, entry| {
        let location = entry
            .error_details
            .as_ref()
            .and_then(|d| d.line)
            .map(|line| format!(" (line {line})"))
            .unwrap_or_default();
        let _ = writeln!(out, "[{}] {}{location}", entry.level.as_str(), entry.text());
        out
    })
}

/// Renders variables as `key = value` lines.
pub fn render_variables(variables: &VariableMap) -> String {
    variables.iter().fold(String::new(), |mut out, (key, value)| {
        let _ = writeln!(out, "{key} = {value}");
        out
    })
}
