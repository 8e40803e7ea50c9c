//! Console log sink port

use courier_domain::LogEntry;

/// Receives console output from scripts and the pipeline.
///
/// Logging is fire-and-forget: implementations must not fail or block.
pub trait LogSink: Send + Sync {
    /// Records one entry.
    fn log(&self, entry: LogEntry);
}
