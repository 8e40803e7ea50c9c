//! Request body definition.
//!
//! The body is a tagged union keyed by [`BodyMode`]. Every mode keeps its own
//! field so switching modes in an editor does not lose data; only the field
//! matching the active mode is meaningful, the others may be stale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::KeyValue;
use crate::error::DomainError;

/// The active body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BodyMode {
    /// No body
    #[default]
    #[serde(rename = "none")]
    None,
    /// Raw text in any language (JSON, XML, plain text...).
    #[serde(rename = "raw")]
    Raw,
    /// Multipart form data.
    #[serde(rename = "form-data")]
    FormData,
    /// URL-encoded form.
    #[serde(rename = "x-www-form-urlencoded")]
    UrlEncoded,
    /// File upload. Not supported by the execution pipeline.
    #[serde(rename = "binary")]
    Binary,
    /// GraphQL query plus JSON variables.
    #[serde(rename = "graphql")]
    Graphql,
}

impl BodyMode {
    /// Returns the wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Raw => "raw",
            Self::FormData => "form-data",
            Self::UrlEncoded => "x-www-form-urlencoded",
            Self::Binary => "binary",
            Self::Graphql => "graphql",
        }
    }
}

impl fmt::Display for BodyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BodyMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::None),
            "raw" => Ok(Self::Raw),
            "form-data" | "formdata" => Ok(Self::FormData),
            "x-www-form-urlencoded" | "urlencoded" => Ok(Self::UrlEncoded),
            "binary" | "file" => Ok(Self::Binary),
            "graphql" => Ok(Self::Graphql),
            other => Err(DomainError::UnsupportedBodyMode(other.to_string())),
        }
    }
}

/// GraphQL body fields. `variables` is JSON text that may contain placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlBody {
    /// The query document.
    #[serde(default)]
    pub query: String,
    /// Variables as JSON source text.
    #[serde(default)]
    pub variables: String,
}

/// HTTP request body definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    /// Which of the fields below is active.
    #[serde(default)]
    pub mode: BodyMode,
    /// Raw text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Editor language hint for the raw body (json, xml, text...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_language: Option<String>,
    /// URL-encoded form fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urlencoded: Vec<KeyValue>,
    /// Multipart form fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_data: Vec<KeyValue>,
    /// GraphQL query and variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graphql: Option<GraphqlBody>,
    /// Path of the file to upload in binary mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

impl RequestBody {
    /// Creates an empty body.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a raw body with a language hint.
    #[must_use]
    pub fn raw(content: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            mode: BodyMode::Raw,
            raw: Some(content.into()),
            raw_language: Some(language.into()),
            ..Self::default()
        }
    }

    /// Creates a raw JSON body.
    #[must_use]
    pub fn json(content: impl Into<String>) -> Self {
        Self::raw(content, "json")
    }

    /// Creates a URL-encoded form body.
    #[must_use]
    pub fn urlencoded(fields: Vec<KeyValue>) -> Self {
        Self {
            mode: BodyMode::UrlEncoded,
            urlencoded: fields,
            ..Self::default()
        }
    }

    /// Creates a multipart form body.
    #[must_use]
    pub fn form_data(fields: Vec<KeyValue>) -> Self {
        Self {
            mode: BodyMode::FormData,
            form_data: fields,
            ..Self::default()
        }
    }

    /// Creates a GraphQL body.
    #[must_use]
    pub fn graphql(query: impl Into<String>, variables: impl Into<String>) -> Self {
        Self {
            mode: BodyMode::Graphql,
            graphql: Some(GraphqlBody {
                query: query.into(),
                variables: variables.into(),
            }),
            ..Self::default()
        }
    }

    /// Creates a binary body referencing a file path.
    #[must_use]
    pub fn binary(path: impl Into<String>) -> Self {
        Self {
            mode: BodyMode::Binary,
            binary: Some(path.into()),
            ..Self::default()
        }
    }
}
