//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or tree edits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The body mode string is not recognized.
    #[error("unsupported body mode: {0}")]
    UnsupportedBodyMode(String),

    /// No node with the given id exists in the project tree.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// A tree edit would break the collection/folder/request structure.
    #[error("invalid tree operation: {0}")]
    InvalidTreeOperation(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
