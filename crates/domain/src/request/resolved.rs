//! Concrete wire requests produced by the resolution pipeline.

use serde::{Deserialize, Serialize};

use super::HttpMethod;

/// Ordered header list with case-insensitive names.
///
/// Inserting a name that is already present replaces the value in place, so
/// the first spelling and position of a header are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedHeaders {
    entries: Vec<(String, String)>,
}

impl ResolvedHeaders {
    /// Creates an empty header list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets a header, replacing any existing header with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Sets a header only when no header with that name exists.
    pub fn insert_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.entries.push((name.to_string(), value.into()));
        }
    }

    /// Returns the value of a header, matching the name case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if a header with the name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes every header with the name.
    pub fn remove(&mut self, name: &str) {
        self.entries
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResolvedHeaders {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// A finalized request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum ResolvedBody {
    /// No body is sent.
    #[default]
    None,
    /// A text body (raw, url-encoded or serialized GraphQL).
    Text(String),
    /// Multipart text fields. The transport chooses the boundary.
    Multipart(Vec<(String, String)>),
}

impl ResolvedBody {
    /// Returns the text content, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::None | Self::Multipart(_) => None,
        }
    }

    /// Returns true if no body is sent.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A request with every placeholder expanded, ready for transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Fully resolved URL
    pub url: String,
    /// Resolved headers, script-added headers merged in
    pub headers: ResolvedHeaders,
    /// Finalized body
    pub body: ResolvedBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_replaces_case_insensitively() {
        let mut headers = ResolvedHeaders::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("content-type", "application/json");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(headers.iter().next(), Some(("Content-Type", "application/json")));
    }

    #[test]
    fn test_insert_if_absent() {
        let mut headers = ResolvedHeaders::new();
        headers.insert("content-type", "text/xml");
        headers.insert_if_absent("Content-Type", "application/json");
        assert_eq!(headers.get("Content-Type"), Some("text/xml"));
    }

    #[test]
    fn test_remove() {
        let mut headers: ResolvedHeaders =
            [("Accept", "*/*"), ("Content-Type", "text/plain")].into_iter().collect();
        headers.remove("content-type");
        assert!(!headers.contains("Content-Type"));
        assert_eq!(headers.len(), 1);
    }
}
