//! Variable scopes and the accessors scripts use to read and write them.
//!
//! Three backing maps (global, collection, environment) are read with one
//! precedence rule. Access comes in two modes: unified access applies the
//! precedence and resolves placeholders, scoped access reads one map raw.

mod accessor;
mod store;

pub use accessor::{AccessMode, VariableAccessor};
pub use store::{ScopeStore, VariableScopes};
