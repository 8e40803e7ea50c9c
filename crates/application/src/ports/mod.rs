//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the execution engine and the outside
//! world. Each port is a trait implemented by adapters in the infrastructure
//! layer (or by test doubles).

mod ancestor_lookup;
mod http_client;
mod log_sink;
mod script_sandbox;

pub use ancestor_lookup::AncestorLookup;
pub use http_client::{HttpClient, HttpClientError};
pub use log_sink::LogSink;
pub use script_sandbox::{ScriptExecutionError, ScriptSandbox};
