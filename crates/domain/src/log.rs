//! Console log entries produced during execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// `console.log`
    #[default]
    Log,
    /// `console.info`
    Info,
    /// `console.warn`
    Warn,
    /// `console.error`
    Error,
}

impl LogLevel {
    /// Returns the lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Extra context attached to error entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    /// Script phase, when the error came from a script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Owning node label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Source line inside the script, if it could be recovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Underlying message.
    pub message: String,
}

/// A single console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Severity, serialized as `type`.
    #[serde(rename = "type")]
    pub level: LogLevel,
    /// Message parts, one per console argument.
    pub message: Vec<String>,
    /// Error context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<ErrorDetails>,
    /// When the entry was created.
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Creates an entry from message parts.
    #[must_use]
    pub fn new(level: LogLevel, message: Vec<String>) -> Self {
        Self {
            level,
            message,
            error_details: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a `log` entry with one part.
    #[must_use]
    pub fn log(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Log, vec![message.into()])
    }

    /// Creates an `info` entry with one part.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, vec![message.into()])
    }

    /// Creates a `warn` entry with one part.
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, vec![message.into()])
    }

    /// Creates an `error` entry with one part.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, vec![message.into()])
    }

    /// Attaches error details.
    #[must_use]
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.error_details = Some(details);
        self
    }

    /// Returns the message parts joined by a space.
    #[must_use]
    pub fn text(&self) -> String {
        self.message.join(" ")
    }
}
