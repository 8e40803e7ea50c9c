//! Arena representation of the project document.
//!
//! Nodes live in a flat vector and refer to each other by [`NodeId`].
//! Removed slots are left empty so ids handed out earlier never point at a
//! different node.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Collection, CollectionItem, Folder, Project};
use crate::environment::Variable;
use crate::error::{DomainError, DomainResult};
use crate::id::generate_id;
use crate::request::ApiRequest;
use crate::scripting::{Script, ScriptKind, scripts_for};

/// Index of a node inside a [`ProjectTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Root-level collection
    Collection,
    /// Folder inside a collection or another folder
    Folder,
    /// Request leaf
    Request,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collection => "collection",
            Self::Folder => "folder",
            Self::Request => "request",
        })
    }
}

/// The payload shared by collections and folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerData {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Declared variables
    pub variables: Vec<Variable>,
    /// Attached scripts
    pub scripts: Vec<Script>,
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeData {
    /// A root collection
    Collection(ContainerData),
    /// A folder
    Folder(ContainerData),
    /// A request
    Request(ApiRequest),
}

impl NodeData {
    /// Returns the node id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Collection(c) | Self::Folder(c) => &c.id,
            Self::Request(r) => &r.id,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Collection(c) | Self::Folder(c) => &c.name,
            Self::Request(r) => &r.name,
        }
    }

    /// Returns the node kind.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Collection(_) => NodeKind::Collection,
            Self::Folder(_) => NodeKind::Folder,
            Self::Request(_) => NodeKind::Request,
        }
    }

    /// Returns the declared variables. Requests declare none.
    #[must_use]
    pub fn variables(&self) -> &[Variable] {
        match self {
            Self::Collection(c) | Self::Folder(c) => &c.variables,
            Self::Request(_) => &[],
        }
    }

    /// Returns the attached scripts.
    #[must_use]
    pub fn scripts(&self) -> &[Script] {
        match self {
            Self::Collection(c) | Self::Folder(c) => &c.scripts,
            Self::Request(r) => &r.scripts,
        }
    }

    /// Label used to tag script errors and log lines, e.g. `folder 'Users'`.
    #[must_use]
    pub fn owner_label(&self) -> String {
        format!("{} '{}'", self.kind(), self.name())
    }

    fn set_id(&mut self, id: String) {
        match self {
            Self::Collection(c) | Self::Folder(c) => c.id = id,
            Self::Request(r) => r.id = id,
        }
    }

    fn set_name(&mut self, name: String) {
        match self {
            Self::Collection(c) | Self::Folder(c) => c.name = name,
            Self::Request(r) => r.name = name,
        }
    }
}

/// Ordered path from a root collection down to one node, inclusive.
///
/// Holds owned snapshots so a chain stays valid while the tree is edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorChain {
    nodes: Vec<NodeData>,
}

impl AncestorChain {
    /// Creates a chain from root-to-leaf node data.
    #[must_use]
    pub const fn new(nodes: Vec<NodeData>) -> Self {
        Self { nodes }
    }

    /// Returns every node, root first.
    #[must_use]
    pub fn nodes(&self) -> &[NodeData] {
        &self.nodes
    }

    /// Returns the last node of the chain.
    #[must_use]
    pub fn target(&self) -> Option<&NodeData> {
        self.nodes.last()
    }

    /// Returns the target request, if the chain ends in one.
    #[must_use]
    pub fn request(&self) -> Option<&ApiRequest> {
        match self.nodes.last() {
            Some(NodeData::Request(request)) => Some(request),
            _ => None,
        }
    }

    /// Returns the root collection.
    #[must_use]
    pub fn collection(&self) -> Option<&ContainerData> {
        match self.nodes.first() {
            Some(NodeData::Collection(collection)) => Some(collection),
            _ => None,
        }
    }

    /// Returns the folders on the chain, shallowest first.
    pub fn folders(&self) -> impl Iterator<Item = &ContainerData> {
        self.nodes.iter().filter_map(|node| match node {
            NodeData::Folder(folder) => Some(folder),
            NodeData::Collection(_) | NodeData::Request(_) => None,
        })
    }

    /// Returns the node names joined by `/`.
    #[must_use]
    pub fn path(&self) -> String {
        self.nodes
            .iter()
            .map(NodeData::name)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Returns every script of `kind` along the chain, root first, paired
    /// with the node that owns it.
    pub fn scripts(&self, kind: ScriptKind) -> impl Iterator<Item = (&NodeData, &Script)> {
        self.nodes
            .iter()
            .flat_map(move |node| scripts_for(node.scripts(), kind).map(move |s| (node, s)))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the chain has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// The project document as an arena of nodes with parent and child links.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    index: HashMap<String, NodeId>,
    global_variables: Vec<Variable>,
}

impl ProjectTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the arena from the nested document.
    ///
    /// If two nodes share an id, lookups by that id find the first one.
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        let mut tree = Self {
            global_variables: project.global_variables.clone(),
            ..Self::default()
        };
        for collection in &project.collections {
            tree.push_collection(collection);
        }
        tree
    }

    /// Rebuilds the nested document.
    #[must_use]
    pub fn to_project(&self) -> Project {
        Project {
            collections: self
                .roots
                .iter()
                .filter_map(|&id| match self.data(id) {
                    Some(NodeData::Collection(c)) => Some(Collection {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        items: self.nested_children(id),
                        variables: c.variables.clone(),
                        scripts: c.scripts.clone(),
                    }),
                    _ => None,
                })
                .collect(),
            global_variables: self.global_variables.clone(),
        }
    }

    /// Returns the project-wide variables.
    #[must_use]
    pub fn global_variables(&self) -> &[Variable] {
        &self.global_variables
    }

    /// Replaces the project-wide variables.
    pub fn set_global_variables(&mut self, variables: Vec<Variable>) {
        self.global_variables = variables;
    }

    /// Returns the root collections in order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Looks up a node by its string id.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.index.get(id).copied()
    }

    /// Returns the data held by a node.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|node| &node.data)
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    /// Returns the children of a node in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the ancestor chain of an item, root collection first and the
    /// item itself last. `None` means the item does not exist.
    #[must_use]
    pub fn find_path(&self, item_id: &str) -> Option<AncestorChain> {
        let mut cursor = self.lookup(item_id);
        let mut nodes = Vec::new();
        while let Some(id) = cursor {
            let node = self.node(id)?;
            nodes.push(node.data.clone());
            cursor = node.parent;
        }
        if nodes.is_empty() {
            return None;
        }
        nodes.reverse();
        Some(AncestorChain::new(nodes))
    }

    /// Appends a collection at the root.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTreeOperation` if any id in the subtree is taken.
    pub fn insert_collection(&mut self, collection: &Collection) -> DomainResult<NodeId> {
        let mut ids = vec![collection.id.as_str()];
        collect_item_ids(&collection.items, &mut ids);
        self.ensure_free(&ids)?;
        Ok(self.push_collection(collection))
    }

    /// Appends an item (and its subtree) under a collection or folder.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown parent, and
    /// `InvalidTreeOperation` if the parent is a request or an id is taken.
    pub fn insert_item(&mut self, parent_id: &str, item: &CollectionItem) -> DomainResult<NodeId> {
        let parent = self.container(parent_id)?;
        let mut ids = Vec::new();
        collect_item_ids(std::slice::from_ref(item), &mut ids);
        self.ensure_free(&ids)?;
        Ok(self.push_item(parent, item))
    }

    /// Removes a node and all of its descendants. Returns how many nodes
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown id.
    pub fn remove(&mut self, id: &str) -> DomainResult<usize> {
        let target = self
            .lookup(id)
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;

        match self.parent(target) {
            Some(parent) => {
                if let Some(node) = self.node_mut(parent) {
                    node.children.retain(|&child| child != target);
                }
            }
            None => self.roots.retain(|&root| root != target),
        }

        let mut removed = 0;
        let mut stack = vec![target];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                if self.index.get(node.data.id()) == Some(&current) {
                    self.index.remove(node.data.id());
                }
                stack.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Copies a node and its subtree next to the original. Every copied node
    /// gets a fresh id and the top copy's name is suffixed with ` (copy)`.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown id.
    pub fn duplicate(&mut self, id: &str) -> DomainResult<NodeId> {
        let source = self
            .lookup(id)
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;
        let parent = self.parent(source);

        let copy = self.copy_subtree(source, parent)?;
        if let Some(data) = self.node_mut(copy).map(|node| &mut node.data) {
            let name = format!("{} (copy)", data.name());
            data.set_name(name);
        }

        let siblings = match parent {
            Some(parent) => match self.node_mut(parent) {
                Some(node) => &mut node.children,
                None => return Ok(copy),
            },
            None => &mut self.roots,
        };
        let position = siblings
            .iter()
            .position(|&sibling| sibling == source)
            .map_or(siblings.len(), |p| p + 1);
        siblings.insert(position, copy);
        Ok(copy)
    }

    /// Replaces a node's payload, keeping its position and children.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown id and `InvalidTreeOperation`
    /// when the replacement changes the node kind or id.
    pub fn replace(&mut self, id: &str, data: NodeData) -> DomainResult<()> {
        let target = self
            .lookup(id)
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;
        let node = self
            .node_mut(target)
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;
        if node.data.kind() != data.kind() {
            return Err(DomainError::InvalidTreeOperation(format!(
                "cannot replace {} '{id}' with a {}",
                node.data.kind(),
                data.kind()
            )));
        }
        if data.id() != id {
            return Err(DomainError::InvalidTreeOperation(format!(
                "replacement for '{id}' carries id '{}'",
                data.id()
            )));
        }
        node.data = data;
        Ok(())
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn container(&self, id: &str) -> DomainResult<NodeId> {
        let node_id = self
            .lookup(id)
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;
        match self.data(node_id) {
            Some(NodeData::Request(_)) => Err(DomainError::InvalidTreeOperation(format!(
                "request '{id}' cannot contain items"
            ))),
            Some(_) => Ok(node_id),
            None => Err(DomainError::ItemNotFound(id.to_string())),
        }
    }

    fn ensure_free(&self, ids: &[&str]) -> DomainResult<()> {
        for (position, id) in ids.iter().enumerate() {
            if self.index.contains_key(*id) || ids[..position].contains(id) {
                return Err(DomainError::InvalidTreeOperation(format!(
                    "id '{id}' is already in use"
                )));
            }
        }
        Ok(())
    }

    fn alloc(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.index.entry(data.id().to_string()).or_insert(id);
        self.nodes.push(Some(Node {
            data,
            parent,
            children: Vec::new(),
        }));
        if let Some(parent) = parent.and_then(|p| self.node_mut(p)) {
            parent.children.push(id);
        }
        id
    }

    fn push_collection(&mut self, collection: &Collection) -> NodeId {
        let data = NodeData::Collection(ContainerData {
            id: collection.id.clone(),
            name: collection.name.clone(),
            variables: collection.variables.clone(),
            scripts: collection.scripts.clone(),
        });
        let id = self.alloc(data, None);
        self.roots.push(id);
        for item in &collection.items {
            self.push_item(id, item);
        }
        id
    }

    fn push_item(&mut self, parent: NodeId, item: &CollectionItem) -> NodeId {
        match item {
            CollectionItem::Request(request) => {
                self.alloc(NodeData::Request(request.clone()), Some(parent))
            }
            CollectionItem::Folder(folder) => {
                let data = NodeData::Folder(ContainerData {
                    id: folder.id.clone(),
                    name: folder.name.clone(),
                    variables: folder.variables.clone(),
                    scripts: folder.scripts.clone(),
                });
                let id = self.alloc(data, Some(parent));
                for child in &folder.items {
                    self.push_item(id, child);
                }
                id
            }
        }
    }

    /// Allocates a fresh-id copy of `source` under `parent` without linking
    /// it into the parent's children; the caller positions it.
    fn copy_subtree(&mut self, source: NodeId, parent: Option<NodeId>) -> DomainResult<NodeId> {
        let node = self
            .node(source)
            .ok_or_else(|| DomainError::ItemNotFound(format!("node #{}", source.0)))?;
        let mut data = node.data.clone();
        let children = node.children.clone();
        data.set_id(generate_id());

        let copy = NodeId(self.nodes.len());
        self.index.insert(data.id().to_string(), copy);
        self.nodes.push(Some(Node {
            data,
            parent,
            children: Vec::new(),
        }));
        for child in children {
            let child_copy = self.copy_subtree(child, Some(copy))?;
            if let Some(node) = self.node_mut(copy) {
                node.children.push(child_copy);
            }
        }
        Ok(copy)
    }

    fn nested_children(&self, id: NodeId) -> Vec<CollectionItem> {
        self.children(id)
            .iter()
            .filter_map(|&child| match self.data(child)? {
                NodeData::Request(request) => Some(CollectionItem::Request(request.clone())),
                NodeData::Folder(folder) => Some(CollectionItem::Folder(Folder {
                    id: folder.id.clone(),
                    name: folder.name.clone(),
                    items: self.nested_children(child),
                    variables: folder.variables.clone(),
                    scripts: folder.scripts.clone(),
                })),
                NodeData::Collection(_) => None,
            })
            .collect()
    }
}

impl From<&Project> for ProjectTree {
    fn from(project: &Project) -> Self {
        Self::from_project(project)
    }
}

fn collect_item_ids<'a>(items: &'a [CollectionItem], ids: &mut Vec<&'a str>) {
    for item in items {
        ids.push(item.id());
        if let CollectionItem::Folder(folder) = item {
            collect_item_ids(&folder.items, ids);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn request(id: &str, name: &str) -> ApiRequest {
        ApiRequest {
            id: id.to_string(),
            ..ApiRequest::new(name)
        }
    }

    fn folder(id: &str, name: &str) -> Folder {
        Folder {
            id: id.to_string(),
            ..Folder::new(name)
        }
    }

    fn sample() -> Project {
        let collection = Collection {
            id: "c1".to_string(),
            ..Collection::new("Api")
        }
        .with_item(
            folder("f1", "Users")
                .with_item(folder("f2", "Admin").with_item(request("r1", "Promote")))
                .with_item(request("r2", "List")),
        )
        .with_item(request("r3", "Health"));
        Project::new().with_collection(collection)
    }

    #[test]
    fn test_find_path_root_to_leaf() {
        let tree = ProjectTree::from_project(&sample());
        let chain = tree.find_path("r1").unwrap();

        let ids: Vec<_> = chain.nodes().iter().map(NodeData::id).collect();
        assert_eq!(ids, vec!["c1", "f1", "f2", "r1"]);
        assert_eq!(chain.path(), "Api/Users/Admin/Promote");
        assert_eq!(chain.collection().unwrap().id, "c1");
        assert_eq!(chain.folders().count(), 2);
        assert_eq!(chain.request().unwrap().name, "Promote");
    }

    #[test]
    fn test_find_path_unknown_id() {
        let tree = ProjectTree::from_project(&sample());
        assert!(tree.find_path("nope").is_none());
    }

    #[test]
    fn test_round_trip_keeps_shape() {
        let project = sample();
        let tree = ProjectTree::from_project(&project);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.to_project(), project);
    }

    #[test]
    fn test_remove_cascades() {
        let mut tree = ProjectTree::from_project(&sample());
        assert_eq!(tree.remove("f1").unwrap(), 4);
        assert!(tree.find_path("r1").is_none());
        assert!(tree.find_path("r3").is_some());
        assert_eq!(tree.to_project().collections[0].items.len(), 1);
    }

    #[test]
    fn test_remove_unknown() {
        let mut tree = ProjectTree::from_project(&sample());
        assert_eq!(
            tree.remove("missing"),
            Err(DomainError::ItemNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_duplicate_uses_fresh_ids() {
        let mut tree = ProjectTree::from_project(&sample());
        let copy = tree.duplicate("f1").unwrap();

        assert_eq!(tree.len(), 10);
        let data = tree.data(copy).unwrap();
        assert_eq!(data.name(), "Users (copy)");
        assert_ne!(data.id(), "f1");

        let items = tree.to_project().collections[0].items.clone();
        let names: Vec<_> = items.iter().map(CollectionItem::name).collect();
        assert_eq!(names, vec!["Users", "Users (copy)", "Health"]);

        let copied_leaf = tree.children(tree.children(copy)[0])[0];
        let leaf_id = tree.data(copied_leaf).unwrap().id().to_string();
        assert_ne!(leaf_id, "r1");
        assert_eq!(tree.find_path(&leaf_id).unwrap().len(), 4);
    }

    #[test]
    fn test_insert_item_rejects_request_parent_and_taken_ids() {
        let mut tree = ProjectTree::from_project(&sample());
        let err = tree
            .insert_item("r3", &CollectionItem::from(ApiRequest::new("x")))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTreeOperation(_)));

        let err = tree
            .insert_item("f1", &CollectionItem::from(request("r2", "Again")))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTreeOperation(_)));

        tree.insert_item("f2", &CollectionItem::from(request("r9", "Demote")))
            .unwrap();
        assert_eq!(tree.find_path("r9").unwrap().path(), "Api/Users/Admin/Demote");
    }

    #[test]
    fn test_replace_keeps_children_and_checks_kind() {
        let mut tree = ProjectTree::from_project(&sample());
        let renamed = NodeData::Folder(ContainerData {
            id: "f1".to_string(),
            name: "People".to_string(),
            variables: vec![Variable::new("team", "core")],
            scripts: Vec::new(),
        });
        tree.replace("f1", renamed).unwrap();
        assert_eq!(tree.find_path("r1").unwrap().path(), "Api/People/Admin/Promote");

        let wrong = NodeData::Request(request("f1", "nope"));
        assert!(tree.replace("f1", wrong).is_err());
    }

    #[test]
    fn test_chain_scripts_root_first() {
        let project = Project::new().with_collection(
            Collection::new("Api")
                .with_script(Script::pre_request("c"))
                .with_item(
                    folder("f", "F")
                        .with_script(Script::pre_request("f"))
                        .with_script(Script::post_request("post"))
                        .with_item(request("r", "R").with_script(Script::pre_request("r"))),
                ),
        );
        let tree = ProjectTree::from_project(&project);
        let chain = tree.find_path("r").unwrap();
        let order: Vec<_> = chain
            .scripts(ScriptKind::PreRequest)
            .map(|(_, s)| s.content.as_str())
            .collect();
        assert_eq!(order, vec!["c", "f", "r"]);
        let (owner, _) = chain.scripts(ScriptKind::PostRequest).next().unwrap();
        assert_eq!(owner.owner_label(), "folder 'F'");
    }
}
