//! Variable domain types

mod variable;

pub use variable::{RuntimeVariables, ScopeKind, Variable, VariableMap, flatten_enabled};
