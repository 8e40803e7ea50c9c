//! Template resolution module
//!
//! Expands `{{variable}}` placeholders against a lookup, repeatedly, so
//! values that themselves contain placeholders are resolved too.
//!
//! # Usage
//!
//! ```
//! use courier_application::template::resolve_template;
//!
//! let resolved = resolve_template("{{host}}/api", |key| {
//!     (key == "host").then(|| "http://localhost".to_string())
//! });
//! assert_eq!(resolved, "http://localhost/api");
//! ```

pub mod engine;
pub mod parser;

pub use engine::{MAX_RESOLUTION_PASSES, ResolutionOutcome, TemplateResolver, resolve_template};
pub use parser::{PlaceholderRef, extract_placeholder_names, has_placeholders, parse_placeholders};
