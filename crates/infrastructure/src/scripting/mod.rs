//! Script execution
//!
//! User scripts run in an embedded `rhai` interpreter. Scripts see a `pm`
//! object bound to the current execution context, a `console`, and a
//! `require` restricted to a small allow-list of modules.

mod bindings;
mod convert;
mod modules;
mod sandbox;

pub use convert::PROLOGUE_LINES;
pub use modules::ALLOWED_MODULES;
pub use sandbox::RhaiSandbox;
