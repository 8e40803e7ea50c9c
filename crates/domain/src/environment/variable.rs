//! Variable types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// A single user-declared variable.
///
/// Keys are not unique structurally: a scope may declare the same key twice,
/// in which case the later declaration wins when the scope is flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Unique identifier
    #[serde(default = "generate_id")]
    pub id: String,
    /// The variable name referenced by `{{key}}` placeholders.
    pub key: String,
    /// The raw variable value. May itself contain placeholders.
    #[serde(default)]
    pub value: String,
    /// Whether this variable participates in resolution.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl Variable {
    /// Creates a new enabled variable.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a disabled variable.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, value)
        }
    }

    /// Returns the value if the variable is enabled.
    #[must_use]
    pub fn enabled_value(&self) -> Option<&str> {
        self.enabled.then_some(self.value.as_str())
    }
}

/// A flattened scope: variable key to raw value.
pub type VariableMap = BTreeMap<String, String>;

/// Session-scoped overlay written by post-request scripts and read by the
/// next pre-request run. Never part of the project document.
pub type RuntimeVariables = BTreeMap<String, String>;

/// Flattens declared variables into a map, skipping disabled entries.
/// Duplicate keys resolve last-write-wins.
#[must_use]
pub fn flatten_enabled<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> VariableMap {
    variables
        .into_iter()
        .filter(|v| v.enabled)
        .map(|v| (v.key.clone(), v.value.clone()))
        .collect()
}

/// The three readable variable scopes, ordered by precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Project-wide global variables - lowest precedence.
    Global = 0,
    /// Variables declared on the root collection.
    Collection = 1,
    /// Folder variables along the ancestor chain plus the runtime overlay.
    Environment = 2,
}

impl ScopeKind {
    /// Scopes in lookup order, most specific first.
    pub const PRECEDENCE: [Self; 3] = [Self::Environment, Self::Collection, Self::Global];

    /// Returns the precedence level (higher = takes priority).
    #[must_use]
    pub const fn precedence(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable name for the scope.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Collection => "Collection",
            Self::Environment => "Environment",
        }
    }
}
