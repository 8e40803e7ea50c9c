//! Script sandbox port

use async_trait::async_trait;
use courier_domain::{Script, ScriptKind};
use thiserror::Error;

use crate::execution::ExecutionContext;

/// A failure raised while parsing or running a user script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{phase} script error in {owner}{}: {message}", .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
pub struct ScriptExecutionError {
    /// Phase the script ran in.
    pub phase: ScriptKind,
    /// Label of the node that owns the script.
    pub owner: String,
    /// 1-based line inside the script body, when it could be recovered.
    pub line: Option<usize>,
    /// Description of the failure.
    pub message: String,
}

impl ScriptExecutionError {
    /// Creates an error without a line number.
    #[must_use]
    pub fn new(phase: ScriptKind, owner: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phase,
            owner: owner.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Attaches a line number.
    #[must_use]
    pub const fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }
}

/// Runs user scripts against an execution context.
///
/// Implementations hold no state between calls; every side effect goes
/// through the context.
#[async_trait]
pub trait ScriptSandbox: Send + Sync {
    /// Runs `script` to completion.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptExecutionError`] tagged with the context's phase and
    /// `owner` if the script fails to parse or throws.
    async fn execute(
        &self,
        script: &Script,
        context: &ExecutionContext,
        owner: &str,
    ) -> Result<(), ScriptExecutionError>;
}
