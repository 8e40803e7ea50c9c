//! Courier Application - request execution engine
//!
//! Template resolution, variable scopes, the execution pipeline and the
//! ports it drives. Adapters for the ports live in `courier-infrastructure`.

pub mod execution;
pub mod ports;
pub mod scope;
pub mod template;

pub use execution::{
    ExecutionContext, ExecutionError, PreRequestOutcome, RequestExecutor, ResolveError,
    RuntimeVariableStore, SendOutcome,
};
pub use ports::{
    AncestorLookup, HttpClient, HttpClientError, LogSink, ScriptExecutionError, ScriptSandbox,
};
pub use scope::{AccessMode, ScopeStore, VariableAccessor, VariableScopes};
pub use template::{TemplateResolver, resolve_template};
