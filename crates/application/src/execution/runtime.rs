//! Session-lived runtime variable overlay

use std::sync::Arc;

use courier_domain::RuntimeVariables;
use parking_lot::RwLock;

/// Shared holder of the runtime overlay.
///
/// A send reads the overlay once when it starts and replaces it wholesale
/// when it ends. Concurrent sends may race: the last writeback wins.
#[derive(Debug, Clone, Default)]
pub struct RuntimeVariableStore {
    inner: Arc<RwLock<RuntimeVariables>>,
}

impl RuntimeVariableStore {
    /// Creates a store with an initial overlay.
    #[must_use]
    pub fn new(initial: RuntimeVariables) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Returns a copy of the current overlay.
    #[must_use]
    pub fn snapshot(&self) -> RuntimeVariables {
        self.inner.read().clone()
    }

    /// Replaces the overlay.
    pub fn replace(&self, variables: RuntimeVariables) {
        *self.inner.write() = variables;
    }
}
