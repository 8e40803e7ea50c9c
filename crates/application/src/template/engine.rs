//! Multi-pass template resolution engine

use regex::Captures;

use super::parser::{PLACEHOLDER, extract_placeholder_names};

/// Upper bound on substitution passes. Reaching it means the variables
/// reference each other in a cycle (or expand without end).
pub const MAX_RESOLUTION_PASSES: usize = 10;

/// Result of resolving one template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// The text after substitution. Unresolved placeholders stay verbatim.
    pub resolved: String,

    /// Number of substitution passes that ran.
    pub passes: usize,

    /// Names of placeholders still present in `resolved`.
    pub unresolved: Vec<String>,

    /// True if the pass limit stopped resolution.
    pub exhausted: bool,
}

impl ResolutionOutcome {
    /// Returns true if no placeholder is left.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Expands placeholders against a lookup function.
///
/// Each pass replaces every placeholder the lookup knows. The text is
/// re-scanned after each pass so values containing placeholders are
/// expanded as well. Resolution stops when nothing is left to replace,
/// when a pass leaves the text unchanged, or after `max_passes` passes.
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver {
    max_passes: usize,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateResolver {
    /// Creates a resolver with the standard pass limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_passes: MAX_RESOLUTION_PASSES,
        }
    }

    /// Creates a resolver with a custom pass limit.
    #[must_use]
    pub const fn with_max_passes(max_passes: usize) -> Self {
        Self { max_passes }
    }

    /// Resolves `text` against `lookup`.
    pub fn resolve<F>(&self, text: &str, lookup: F) -> ResolutionOutcome
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut current = text.to_string();
        let mut passes = 0;
        let mut exhausted = false;

        while PLACEHOLDER.is_match(&current) {
            if passes == self.max_passes {
                exhausted = true;
                tracing::warn!(
                    passes,
                    template = text,
                    "template resolution stopped at the pass limit; placeholders left verbatim"
                );
                break;
            }

            let next = PLACEHOLDER
                .replace_all(&current, |caps: &Captures<'_>| {
                    caps.get(1)
                        .and_then(|name| lookup(name.as_str()))
                        .unwrap_or_else(|| caps[0].to_string())
                })
                .into_owned();
            passes += 1;

            if next == current {
                break;
            }
            current = next;
        }

        let unresolved = extract_placeholder_names(&current);
        ResolutionOutcome {
            resolved: current,
            passes,
            unresolved,
            exhausted,
        }
    }
}

/// Resolves `text` with the standard resolver and returns only the text.
pub fn resolve_template<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    TemplateResolver::new().resolve(text, lookup).resolved
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_no_placeholders_is_untouched() {
        let outcome = TemplateResolver::new().resolve("plain text", |_| None);
        assert_eq!(outcome.resolved, "plain text");
        assert_eq!(outcome.passes, 0);
        assert!(outcome.is_complete());
    }

    #[test]
    fn test_single_pass() {
        let map = vars(&[("host", "localhost"), ("port", "8080")]);
        let resolved = resolve_template("http://{{host}}:{{ port }}/", |k| map.get(k).cloned());
        assert_eq!(resolved, "http://localhost:8080/");
    }

    #[test]
    fn test_chained_values() {
        let map = vars(&[("baseUrl", "http://x"), ("path", "{{baseUrl}}/a")]);
        let outcome = TemplateResolver::new().resolve("{{path}}", |k| map.get(k).cloned());
        assert_eq!(outcome.resolved, "http://x/a");
        assert_eq!(outcome.passes, 2);
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        let map = vars(&[("a", "1")]);
        let outcome = TemplateResolver::new().resolve("{{a}}-{{missing}}", |k| map.get(k).cloned());
        assert_eq!(outcome.resolved, "1-{{missing}}");
        assert_eq!(outcome.unresolved, vec!["missing"]);
        assert!(!outcome.exhausted);
    }

    #[test]
    fn test_cycle_stops_at_pass_limit() {
        let map = vars(&[("a", "{{b}}"), ("b", "{{a}}")]);
        let outcome = TemplateResolver::new().resolve("{{a}}", |k| map.get(k).cloned());
        assert!(outcome.exhausted);
        assert_eq!(outcome.passes, MAX_RESOLUTION_PASSES);
        assert!(outcome.resolved.contains("{{"));
    }

    #[test]
    fn test_self_reference_stops_after_one_pass() {
        let map = vars(&[("a", "{{a}}")]);
        let outcome = TemplateResolver::new().resolve("x-{{a}}", |k| map.get(k).cloned());
        assert_eq!(outcome.resolved, "x-{{a}}");
        assert_eq!(outcome.passes, 1);
        assert!(!outcome.exhausted);
        assert_eq!(outcome.unresolved, vec!["a"]);
    }

    #[test]
    fn test_runaway_expansion_is_bounded() {
        let map = vars(&[("x", "{{x}}{{x}}")]);
        let outcome = TemplateResolver::with_max_passes(3).resolve("{{x}}", |k| map.get(k).cloned());
        assert!(outcome.exhausted);
        assert_eq!(outcome.passes, 3);
        assert_eq!(outcome.resolved.matches("{{x}}").count(), 8);
    }
}
