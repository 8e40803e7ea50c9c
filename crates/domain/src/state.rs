//! Execution state of a single request send.
//!
//! A send walks `idle → resolving-pre-scripts → resolved → sending →
//! received → resolving-post-scripts → done`. Any non-terminal state may
//! move to `failed`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a send currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionState {
    /// Nothing has happened yet.
    #[default]
    Idle,
    /// Pre-request scripts are running.
    ResolvingPreScripts,
    /// The concrete request has been built.
    Resolved,
    /// The transport call is in flight.
    Sending,
    /// A response (or synthetic failure response) is available.
    Received,
    /// Post-request scripts are running.
    ResolvingPostScripts,
    /// The send completed.
    Done,
    /// A script, resolution or transport failure ended the send.
    Failed,
}

impl ExecutionState {
    /// Returns true for `Done` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns the state that normally follows this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::ResolvingPreScripts),
            Self::ResolvingPreScripts => Some(Self::Resolved),
            Self::Resolved => Some(Self::Sending),
            Self::Sending => Some(Self::Received),
            Self::Received => Some(Self::ResolvingPostScripts),
            Self::ResolvingPostScripts => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns true if moving to `target` is allowed.
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        !self.is_terminal() && (target == Self::Failed || self.next() == Some(target))
    }

    /// Returns the kebab-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ResolvingPreScripts => "resolving-pre-scripts",
            Self::Resolved => "resolved",
            Self::Sending => "sending",
            Self::Received => "received",
            Self::ResolvingPostScripts => "resolving-post-scripts",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
