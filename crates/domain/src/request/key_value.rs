//! Key/value pairs used by headers and form bodies.

use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// An enable-able key/value pair.
///
/// Headers, url-encoded fields and form-data fields share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Unique identifier
    #[serde(default = "generate_id")]
    pub id: String,
    /// The key (may contain placeholders).
    pub key: String,
    /// The value (may contain placeholders).
    #[serde(default)]
    pub value: String,
    /// Whether this pair is sent.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// A request header definition.
pub type Header = KeyValue;

const fn default_enabled() -> bool {
    true
}

impl KeyValue {
    /// Creates a new enabled pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a new disabled pair.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, value)
        }
    }
}
