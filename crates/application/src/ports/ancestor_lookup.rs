//! Ancestor chain lookup port

use courier_domain::{AncestorChain, ProjectTree};

/// Finds the path from a root collection to an item.
pub trait AncestorLookup: Send + Sync {
    /// Returns `[collection, ...folders, item]`, or `None` if the item no
    /// longer exists.
    fn find_path(&self, item_id: &str) -> Option<AncestorChain>;
}

impl AncestorLookup for ProjectTree {
    fn find_path(&self, item_id: &str) -> Option<AncestorChain> {
        Self::find_path(self, item_id)
    }
}
