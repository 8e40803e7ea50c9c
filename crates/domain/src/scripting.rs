//! Pre-request and post-request scripting.
//!
//! Scripts are attached to collections, folders and requests. Every script on
//! an item's ancestor chain runs for that item, root first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// A user-authored script attached to a tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Unique identifier
    #[serde(default = "generate_id")]
    pub id: String,
    /// When the script runs.
    #[serde(rename = "type")]
    pub kind: ScriptKind,
    /// The script source text.
    #[serde(default)]
    pub content: String,
}

impl Script {
    /// Creates a pre-request script with the given source.
    #[must_use]
    pub fn pre_request(content: impl Into<String>) -> Self {
        Self::new(ScriptKind::PreRequest, content)
    }

    /// Creates a post-request script with the given source.
    #[must_use]
    pub fn post_request(content: impl Into<String>) -> Self {
        Self::new(ScriptKind::PostRequest, content)
    }

    /// Creates a script of the given kind.
    #[must_use]
    pub fn new(kind: ScriptKind, content: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            kind,
            content: content.into(),
        }
    }

    /// Check if the script is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Check if the script should run in the given phase.
    #[must_use]
    pub fn should_run(&self, phase: ScriptKind) -> bool {
        self.kind == phase && !self.is_empty()
    }
}

/// Script phase. Doubles as the tag on script execution errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptKind {
    /// Runs before the request is resolved and sent.
    #[serde(rename = "pre-request")]
    PreRequest,
    /// Runs after the response is received.
    #[serde(rename = "post-request")]
    PostRequest,
}

impl ScriptKind {
    /// Returns the phase label used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreRequest => "pre-request",
            Self::PostRequest => "post-request",
        }
    }

    /// Returns the event name scripts see through `pm.info.eventName`.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::PreRequest => "prerequest",
            Self::PostRequest => "test",
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the scripts of `kind` from a node's script list, in declaration order.
pub fn scripts_for(scripts: &[Script], kind: ScriptKind) -> impl Iterator<Item = &Script> {
    scripts.iter().filter(move |s| s.should_run(kind))
}
