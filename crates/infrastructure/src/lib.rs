//! Courier Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the `rhai` script sandbox, the
//! `reqwest` transport, console sinks, and settings and document files.

pub mod adapters;
pub mod persistence;
pub mod scripting;
pub mod serialization;
pub mod settings;

pub use adapters::{BufferedLogSink, ReqwestHttpClient, TracingLogSink};
pub use persistence::{
    DocumentError, SettingsError, SettingsRepository, load_project, load_runtime, save_runtime,
};
pub use scripting::RhaiSandbox;
pub use serialization::{
    SerializationError, from_json, from_json_bytes, to_json_stable, to_json_stable_bytes,
};
pub use settings::{EngineSettings, HttpSettings, ScriptSettings};
