//! Scoped and unified variable accessors

use std::collections::BTreeMap;

use courier_domain::ScopeKind;

use super::ScopeStore;
use crate::template::{ResolutionOutcome, TemplateResolver};

/// How an accessor reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Precedence lookup with placeholder resolution. Writes go to the
    /// environment scope.
    Unified,
    /// Raw access to a single scope.
    Scoped(ScopeKind),
}

/// A view over the [`ScopeStore`] in one access mode.
///
/// Absent keys yield `None`; that is a normal outcome, never an error.
#[derive(Debug, Clone)]
pub struct VariableAccessor {
    store: ScopeStore,
    mode: AccessMode,
}

impl VariableAccessor {
    /// Creates an accessor over `store`.
    #[must_use]
    pub const fn new(store: ScopeStore, mode: AccessMode) -> Self {
        Self { store, mode }
    }

    /// Returns the access mode.
    #[must_use]
    pub const fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Returns the value of `key`.
    ///
    /// Unified access returns the most specific value with its placeholders
    /// resolved against the unified view; scoped access returns the raw
    /// value of its own scope.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.mode {
            AccessMode::Unified => self.store.read(|scopes| {
                let raw = scopes.lookup_raw(key)?;
                Some(
                    TemplateResolver::new()
                        .resolve(raw, |name| scopes.lookup_raw(name).map(str::to_string))
                        .resolved,
                )
            }),
            AccessMode::Scoped(kind) => self.store.read(|scopes| scopes.scope(kind).get(key).cloned()),
        }
    }

    /// Sets `key`. Unified writes land in the environment scope.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let kind = self.write_scope();
        let (key, value) = (key.into(), value.into());
        self.store.write(|scopes| scopes.scope_mut(kind).insert(key, value));
    }

    /// Returns true if `key` is defined. Unified access checks every scope.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        match self.mode {
            AccessMode::Unified => self.store.read(|scopes| scopes.contains(key)),
            AccessMode::Scoped(kind) => self.store.read(|scopes| scopes.scope(kind).contains_key(key)),
        }
    }

    /// Removes `key`. Unified access only removes from the environment scope.
    pub fn unset(&self, key: &str) {
        let kind = self.write_scope();
        self.store.write(|scopes| scopes.scope_mut(kind).remove(key));
    }

    /// Empties the scope. Unified access only clears the environment scope.
    pub fn clear(&self) {
        let kind = self.write_scope();
        self.store.write(|scopes| scopes.scope_mut(kind).clear());
    }

    /// Returns every visible key with its value.
    ///
    /// Unified access lists keys from all scopes, each resolved as by
    /// [`get`](Self::get); scoped access copies its own map.
    #[must_use]
    pub fn to_object(&self) -> BTreeMap<String, String> {
        match self.mode {
            AccessMode::Unified => {
                let keys: Vec<String> = self
                    .store
                    .read(|scopes| scopes.keys().into_iter().map(str::to_string).collect());
                keys.into_iter()
                    .filter_map(|key| self.get(&key).map(|value| (key, value)))
                    .collect()
            }
            AccessMode::Scoped(kind) => self.store.read(|scopes| scopes.scope(kind).clone()),
        }
    }

    /// Resolves placeholders in arbitrary text against the unified view.
    #[must_use]
    pub fn replace_in(&self, text: &str) -> ResolutionOutcome {
        self.store.read(|scopes| {
            TemplateResolver::new().resolve(text, |name| scopes.lookup_raw(name).map(str::to_string))
        })
    }

    const fn write_scope(&self) -> ScopeKind {
        match self.mode {
            AccessMode::Unified => ScopeKind::Environment,
            AccessMode::Scoped(kind) => kind,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::scope::VariableScopes;
    use pretty_assertions::assert_eq;

    fn store(globals: &[(&str, &str)], collection: &[(&str, &str)], environment: &[(&str, &str)]) -> ScopeStore {
        let map = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect()
        };
        ScopeStore::new(VariableScopes {
            globals: map(globals),
            collection: map(collection),
            environment: map(environment),
        })
    }

    #[test]
    fn test_undefined_key_is_none() {
        let store = store(&[("a", "1")], &[], &[]);
        assert_eq!(store.unified().get("nope"), None);
        assert_eq!(store.scoped(ScopeKind::Environment).get("nope"), None);
        assert!(!store.unified().has("nope"));
    }

    #[test]
    fn test_unified_precedence() {
        let store = store(
            &[("only_global", "g"), ("shadow_c", "g"), ("shadow_e", "g")],
            &[("shadow_c", "c"), ("shadow_e", "c")],
            &[("shadow_e", "e")],
        );
        let vars = store.unified();
        assert_eq!(vars.get("only_global").unwrap(), "g");
        assert_eq!(vars.get("shadow_c").unwrap(), "c");
        assert_eq!(vars.get("shadow_e").unwrap(), "e");
    }

    #[test]
    fn test_recursive_resolution_across_globals() {
        let store = store(&[("baseUrl", "http://x"), ("path", "{{baseUrl}}/a")], &[], &[]);
        assert_eq!(store.unified().get("path").unwrap(), "http://x/a");
    }

    #[test]
    fn test_recursive_resolution_across_scopes() {
        let store = store(&[("host", "api.test")], &[("base", "https://{{host}}")], &[("url", "{{base}}/v1")]);
        assert_eq!(store.unified().get("url").unwrap(), "https://api.test/v1");
    }

    #[test]
    fn test_cycle_terminates() {
        let store = store(&[("a", "{{b}}"), ("b", "{{a}}")], &[], &[]);
        let value = store.unified().get("a").unwrap();
        assert!(value.contains("{{"));
    }

    #[test]
    fn test_scoped_is_raw_and_unified_resolves() {
        let store = store(&[("x", "{{y}}")], &[], &[]);
        let globals = store.scoped(ScopeKind::Global);
        let vars = store.unified();

        assert_eq!(globals.get("x").unwrap(), "{{y}}");
        assert_eq!(vars.get("x").unwrap(), "{{y}}");

        globals.set("y", "defined");
        assert_eq!(vars.get("x").unwrap(), "defined");
        assert_eq!(globals.get("x").unwrap(), "{{y}}");
    }

    #[test]
    fn test_unified_writes_go_to_environment() {
        let store = store(&[("g", "1")], &[("c", "2")], &[]);
        let vars = store.unified();

        vars.set("new", "value");
        assert_eq!(store.scoped(ScopeKind::Environment).get("new").unwrap(), "value");

        vars.unset("g");
        assert!(vars.has("g"));

        vars.clear();
        assert!(vars.has("c"));
        assert!(!vars.has("new"));
    }

    #[test]
    fn test_scoped_writes_stay_in_scope() {
        let store = store(&[], &[("k", "old")], &[]);
        let collection = store.scoped(ScopeKind::Collection);
        collection.set("k", "new");
        collection.unset("missing");
        assert_eq!(collection.get("k").unwrap(), "new");
        assert!(!store.scoped(ScopeKind::Environment).has("k"));
        collection.clear();
        assert!(collection.to_object().is_empty());
    }

    #[test]
    fn test_to_object_unified_resolves_every_key() {
        let store = store(&[("host", "h"), ("url", "{{host}}/x")], &[("c", "1")], &[("e", "{{c}}")]);
        let object = store.unified().to_object();
        assert_eq!(object.len(), 4);
        assert_eq!(object["url"], "h/x");
        assert_eq!(object["e"], "1");

        let raw = store.scoped(ScopeKind::Environment).to_object();
        assert_eq!(raw["e"], "{{c}}");
    }

    #[test]
    fn test_replace_in() {
        let store = store(&[("name", "world")], &[], &[]);
        let outcome = store.unified().replace_in("hello {{name}} {{other}}");
        assert_eq!(outcome.resolved, "hello world {{other}}");
    }
}
