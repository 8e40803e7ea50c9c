//! HTTP transport port

use async_trait::async_trait;
use courier_domain::{ResolvedRequest, ResponseSpec};
use thiserror::Error;

/// Transport-level failures. An HTTP error status is not one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request timed out.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// The configured timeout.
        timeout_ms: u64,
    },

    /// The host name could not be resolved.
    #[error("could not resolve host '{host}': {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (limit {max})")]
    TooManyRedirects {
        /// The configured limit.
        max: usize,
    },

    /// The request body or a header could not be sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Executes one resolved request.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `request` and returns the captured response.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures (DNS, connect, timeout,
    /// invalid URL). Any HTTP status is a successful response.
    async fn execute(&self, request: &ResolvedRequest) -> Result<ResponseSpec, HttpClientError>;
}
