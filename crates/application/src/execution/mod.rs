//! Request execution pipeline
//!
//! Locates the item's ancestor chain, builds its scopes, runs pre-request
//! scripts root to leaf, resolves the request, calls the transport, runs
//! post-request scripts and hands back the new runtime overlay.

mod context;
mod error;
mod executor;
mod resolve;
mod runtime;

pub use context::{ExecutionContext, RequestHeaders, RequestInfo, RequestView};
pub use error::{ExecutionError, ResolveError};
pub use executor::{PreRequestOutcome, RequestExecutor, SendOutcome};
pub use resolve::resolve_request_with;
pub use runtime::RuntimeVariableStore;
