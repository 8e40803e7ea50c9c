//! Courier Domain - Core business types
//!
//! This crate defines the entity model of the request execution engine:
//! variables, scripts, requests, the project tree, responses and console
//! log entries. All types here are pure Rust with no I/O dependencies.

pub mod collection;
pub mod environment;
pub mod error;
pub mod id;
pub mod log;
pub mod request;
pub mod response;
pub mod scripting;
pub mod state;

pub use collection::{
    AncestorChain, Collection, CollectionItem, ContainerData, Folder, NodeData, NodeId, NodeKind,
    Project, ProjectTree,
};
pub use environment::{RuntimeVariables, ScopeKind, Variable, VariableMap, flatten_enabled};
pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use log::{ErrorDetails, LogEntry, LogLevel};
pub use request::{
    ApiRequest, BodyMode, GraphqlBody, Header, HttpMethod, KeyValue, RequestBody, ResolvedBody,
    ResolvedHeaders, ResolvedRequest,
};
pub use response::{ResponseSpec, StatusCode};
pub use scripting::{Script, ScriptKind, scripts_for};
pub use state::ExecutionState;
