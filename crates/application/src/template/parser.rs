//! Placeholder parser for `{{name}}` syntax
//!
//! A placeholder is `{{`, optional whitespace, one or more ASCII letters,
//! digits, underscores, dots or hyphens, optional whitespace, then `}}`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used)]
pub(crate) static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").unwrap());

/// A placeholder found in a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    /// The variable name (without braces or padding).
    pub name: String,

    /// Byte range of the whole placeholder in the input.
    pub span: Range<usize>,
}

/// Parses a string and returns every placeholder in order.
///
/// # Examples
///
/// ```
/// use courier_application::template::parse_placeholders;
///
/// let refs = parse_placeholders("{{ baseUrl }}/users/{{user.id}}");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[0].name, "baseUrl");
/// assert_eq!(refs[1].name, "user.id");
/// ```
#[must_use]
pub fn parse_placeholders(input: &str) -> Vec<PlaceholderRef> {
    PLACEHOLDER
        .captures_iter(input)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some(PlaceholderRef {
                name: name.as_str().to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

/// Returns true if the input contains at least one placeholder.
#[must_use]
pub fn has_placeholders(input: &str) -> bool {
    PLACEHOLDER.is_match(input)
}

/// Returns the distinct placeholder names in first-seen order.
#[must_use]
pub fn extract_placeholder_names(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for reference in parse_placeholders(input) {
        if !names.contains(&reference.name) {
            names.push(reference.name);
        }
    }
    names
}
