//! Engine settings.
//!
//! Transport and sandbox limits. Every field has a serde default so a
//! partial settings file only overrides what it names.

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Transport settings.
    #[serde(default)]
    pub http: HttpSettings,
    /// Script sandbox limits.
    #[serde(default)]
    pub script: ScriptSettings,
}

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSettings {
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum redirects followed before failing.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Value of the `User-Agent` header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("Courier/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

/// Resource limits applied to each script execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSettings {
    /// Interpreter operations allowed per script run (0 = unlimited).
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
    /// Maximum function call depth.
    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,
    /// Maximum length of any string value (0 = unlimited).
    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,
    /// `pm.sendRequest` calls allowed per script run, callbacks included.
    #[serde(default = "default_max_nested_requests")]
    pub max_nested_requests: usize,
}

const fn default_max_operations() -> u64 {
    1_000_000
}

const fn default_max_call_levels() -> usize {
    64
}

const fn default_max_string_size() -> usize {
    10 * 1024 * 1024
}

const fn default_max_nested_requests() -> usize {
    16
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_string_size: default_max_string_size(),
            max_nested_requests: default_max_nested_requests(),
        }
    }
}
