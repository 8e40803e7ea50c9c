//! Console sinks.

use std::sync::Arc;

use courier_application::ports::LogSink;
use courier_domain::{LogEntry, LogLevel};
use parking_lot::Mutex;

/// Forwards console entries to `tracing` under the `courier::console` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, entry: LogEntry) {
        let text = entry.text();
        let line = entry.error_details.as_ref().and_then(|d| d.line);
        match entry.level {
            LogLevel::Log | LogLevel::Info => {
                tracing::info!(target: "courier::console", level = entry.level.as_str(), "{text}");
            }
            LogLevel::Warn => tracing::warn!(target: "courier::console", "{text}"),
            LogLevel::Error => tracing::error!(target: "courier::console", ?line, "{text}"),
        }
    }
}

/// Collects entries in memory, optionally forwarding them to another sink.
#[derive(Clone, Default)]
pub struct BufferedLogSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    forward: Option<Arc<dyn LogSink>>,
}

impl BufferedLogSink {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer that also forwards every entry to `sink`.
    #[must_use]
    pub fn forwarding(sink: Arc<dyn LogSink>) -> Self {
        Self {
            entries: Arc::default(),
            forward: Some(sink),
        }
    }

    /// Returns a copy of the collected entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Removes and returns the collected entries.
    #[must_use]
    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl std::fmt::Debug for BufferedLogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferedLogSink")
            .field("entries", &self.entries.lock().len())
            .field("forwarding", &self.forward.is_some())
            .finish()
    }
}

impl LogSink for BufferedLogSink {
    fn log(&self, entry: LogEntry) {
        if let Some(forward) = &self.forward {
            forward.log(entry.clone());
        }
        self.entries.lock().push(entry);
    }
}
