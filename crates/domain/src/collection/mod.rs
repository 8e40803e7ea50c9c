//! Collections, folders and the project document.
//!
//! Two shapes of the same tree live here: the nested [`Project`] used for
//! interchange, and the [`ProjectTree`] arena used for lookups and edits.

mod item;
mod tree;

pub use item::{Collection, CollectionItem, Folder, Project};
pub use tree::{AncestorChain, ContainerData, NodeData, NodeId, NodeKind, ProjectTree};
