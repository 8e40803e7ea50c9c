//! Request definition leaf node

use serde::{Deserialize, Serialize};

use super::{Header, HttpMethod, RequestBody};
use crate::id::generate_id;
use crate::scripting::Script;

/// A templated HTTP request definition. Leaf node of the project tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// Unique identifier
    #[serde(default = "generate_id")]
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// HTTP method
    #[serde(default)]
    pub method: HttpMethod,
    /// Target URL (may contain variable placeholders)
    #[serde(default)]
    pub url: String,
    /// Declared headers
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Request body
    #[serde(default)]
    pub body: RequestBody,
    /// Scripts owned by this request
    #[serde(default)]
    pub scripts: Vec<Script>,
}

impl ApiRequest {
    /// Creates a new GET request with no URL.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            method: HttpMethod::default(),
            url: String::new(),
            headers: Vec::new(),
            body: RequestBody::none(),
            scripts: Vec::new(),
        }
    }

    /// Creates a request with the given method and URL.
    #[must_use]
    pub fn with_url(name: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::new(name)
        }
    }

    /// Adds a header definition.
    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Replaces the body definition.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Attaches a script.
    #[must_use]
    pub fn with_script(mut self, script: Script) -> Self {
        self.scripts.push(script);
        self
    }

    /// Returns the enabled header definitions in declaration order.
    pub fn enabled_headers(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter().filter(|h| h.enabled)
    }
}

impl Default for ApiRequest {
    fn default() -> Self {
        Self::new("New Request")
    }
}
