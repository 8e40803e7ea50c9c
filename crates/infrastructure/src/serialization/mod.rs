//! Deterministic JSON serialization for project, runtime and settings files.
//!
//! - Keys in map-backed types stay sorted (`BTreeMap` in domain types)
//! - 2-space indentation
//! - Trailing newline

mod json;

pub use json::*;
