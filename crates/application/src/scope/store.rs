//! Scope construction and the shared store handle

use std::collections::BTreeSet;
use std::sync::Arc;

use courier_domain::{
    AncestorChain, RuntimeVariables, ScopeKind, Variable, VariableMap, flatten_enabled,
};
use parking_lot::RwLock;

use super::{AccessMode, VariableAccessor};

/// The three variable maps in effect for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableScopes {
    /// Enabled project-wide variables.
    pub globals: VariableMap,
    /// Enabled variables of the root collection.
    pub collection: VariableMap,
    /// Enabled folder variables in ancestor order, overlaid with the
    /// runtime variables.
    pub environment: VariableMap,
}

impl VariableScopes {
    /// Builds the scopes for the item at the end of `chain`.
    #[must_use]
    pub fn build(globals: &[Variable], chain: &AncestorChain, runtime: &RuntimeVariables) -> Self {
        let collection = chain
            .collection()
            .map(|c| flatten_enabled(&c.variables))
            .unwrap_or_default();

        let mut environment = VariableMap::new();
        for folder in chain.folders() {
            environment.extend(flatten_enabled(&folder.variables));
        }
        environment.extend(runtime.iter().map(|(k, v)| (k.clone(), v.clone())));

        Self {
            globals: flatten_enabled(globals),
            collection,
            environment,
        }
    }

    /// Returns one backing map.
    #[must_use]
    pub const fn scope(&self, kind: ScopeKind) -> &VariableMap {
        match kind {
            ScopeKind::Global => &self.globals,
            ScopeKind::Collection => &self.collection,
            ScopeKind::Environment => &self.environment,
        }
    }

    /// Returns one backing map mutably.
    pub const fn scope_mut(&mut self, kind: ScopeKind) -> &mut VariableMap {
        match kind {
            ScopeKind::Global => &mut self.globals,
            ScopeKind::Collection => &mut self.collection,
            ScopeKind::Environment => &mut self.environment,
        }
    }

    /// Returns the raw value of the most specific scope that defines `key`.
    #[must_use]
    pub fn lookup_raw(&self, key: &str) -> Option<&str> {
        ScopeKind::PRECEDENCE
            .iter()
            .find_map(|&kind| self.scope(kind).get(key))
            .map(String::as_str)
    }

    /// Returns true if any scope defines `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lookup_raw(key).is_some()
    }

    /// Returns every key defined in any scope, sorted.
    #[must_use]
    pub fn keys(&self) -> BTreeSet<&str> {
        ScopeKind::PRECEDENCE
            .iter()
            .flat_map(|&kind| self.scope(kind).keys().map(String::as_str))
            .collect()
    }
}

/// Shared handle to the scopes of one execution.
///
/// Every script of a send sees the same store, so writes made by one
/// script are visible to the next one and to request resolution.
#[derive(Debug, Clone, Default)]
pub struct ScopeStore {
    inner: Arc<RwLock<VariableScopes>>,
}

impl ScopeStore {
    /// Wraps already built scopes.
    #[must_use]
    pub fn new(scopes: VariableScopes) -> Self {
        Self {
            inner: Arc::new(RwLock::new(scopes)),
        }
    }

    /// Builds the scopes for an item and wraps them.
    #[must_use]
    pub fn build(globals: &[Variable], chain: &AncestorChain, runtime: &RuntimeVariables) -> Self {
        Self::new(VariableScopes::build(globals, chain, runtime))
    }

    /// Runs `f` with read access to the scopes.
    pub fn read<R>(&self, f: impl FnOnce(&VariableScopes) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` with write access to the scopes.
    pub fn write<R>(&self, f: impl FnOnce(&mut VariableScopes) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Returns a copy of all scopes.
    #[must_use]
    pub fn snapshot(&self) -> VariableScopes {
        self.inner.read().clone()
    }

    /// Returns a copy of the raw environment scope. This becomes the next
    /// runtime overlay.
    #[must_use]
    pub fn environment_snapshot(&self) -> RuntimeVariables {
        self.inner.read().environment.clone()
    }

    /// Returns the unified (`pm.variables`) accessor.
    #[must_use]
    pub fn unified(&self) -> VariableAccessor {
        VariableAccessor::new(self.clone(), AccessMode::Unified)
    }

    /// Returns the raw accessor for one scope.
    #[must_use]
    pub fn scoped(&self, kind: ScopeKind) -> VariableAccessor {
        VariableAccessor::new(self.clone(), AccessMode::Scoped(kind))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use courier_domain::{ContainerData, NodeData};
    use pretty_assertions::assert_eq;

    fn container(name: &str, variables: Vec<Variable>) -> ContainerData {
        ContainerData {
            id: name.to_lowercase(),
            name: name.to_string(),
            variables,
            scripts: Vec::new(),
        }
    }

    #[test]
    fn test_build_layers_folders_and_runtime() {
        let chain = AncestorChain::new(vec![
            NodeData::Collection(container("Api", vec![Variable::new("c", "collection")])),
            NodeData::Folder(container(
                "Outer",
                vec![Variable::new("depth", "outer"), Variable::new("keep", "outer")],
            )),
            NodeData::Folder(container(
                "Inner",
                vec![Variable::new("depth", "inner"), Variable::disabled("keep", "off")],
            )),
        ]);
        let runtime: RuntimeVariables = [("token".to_string(), "abc".to_string())].into();
        let globals = vec![Variable::new("g", "global"), Variable::disabled("off", "x")];

        let scopes = VariableScopes::build(&globals, &chain, &runtime);

        assert_eq!(scopes.globals.len(), 1);
        assert_eq!(scopes.collection.get("c").unwrap(), "collection");
        assert_eq!(scopes.environment.get("depth").unwrap(), "inner");
        assert_eq!(scopes.environment.get("keep").unwrap(), "outer");
        assert_eq!(scopes.environment.get("token").unwrap(), "abc");
    }

    #[test]
    fn test_runtime_overrides_folder_variables() {
        let chain = AncestorChain::new(vec![
            NodeData::Collection(container("Api", Vec::new())),
            NodeData::Folder(container("F", vec![Variable::new("token", "declared")])),
        ]);
        let runtime: RuntimeVariables = [("token".to_string(), "fresh".to_string())].into();
        let scopes = VariableScopes::build(&[], &chain, &runtime);
        assert_eq!(scopes.lookup_raw("token"), Some("fresh"));
    }

    #[test]
    fn test_precedence_each_level_shadowed() {
        let scopes = VariableScopes {
            globals: [("a", "g"), ("b", "g"), ("c", "g")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            collection: [("b", "c"), ("c", "c")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            environment: [("c", "e")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        assert_eq!(scopes.lookup_raw("a"), Some("g"));
        assert_eq!(scopes.lookup_raw("b"), Some("c"));
        assert_eq!(scopes.lookup_raw("c"), Some("e"));
        assert_eq!(scopes.lookup_raw("d"), None);
        assert_eq!(scopes.keys().into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_store_clones_share_state() {
        let store = ScopeStore::default();
        let other = store.clone();
        store.write(|s| s.environment.insert("k".into(), "v".into()));
        assert_eq!(other.environment_snapshot().get("k").unwrap(), "v");
    }
}
