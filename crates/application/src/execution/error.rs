//! Execution pipeline errors

use thiserror::Error;

use crate::ports::{HttpClientError, ScriptExecutionError};

/// A request definition could not be turned into a wire request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// A GraphQL field that must hold JSON did not parse after resolution.
    #[error("invalid JSON in GraphQL {field}: {message}")]
    InvalidGraphqlJson {
        /// Name of the offending field.
        field: &'static str,
        /// Parser message.
        message: String,
    },

    /// URL-encoded form fields could not be encoded.
    #[error("could not encode form body: {0}")]
    FormEncoding(String),
}

/// Errors surfaced by the execution pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// The ancestor lookup does not know the item; it was probably removed.
    #[error("item not found (it may have been removed): {0}")]
    ItemNotFound(String),

    /// The item exists but is a collection or folder.
    #[error("item '{0}' is not a request")]
    NotARequest(String),

    /// A user script failed.
    #[error(transparent)]
    Script(#[from] ScriptExecutionError),

    /// Request resolution failed before anything was sent.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The transport failed during a nested `sendRequest`.
    #[error("transport error: {0}")]
    Transport(#[from] HttpClientError),
}
