//! Nested collection item types

use serde::{Deserialize, Serialize};

use crate::environment::Variable;
use crate::id::generate_id;
use crate::request::ApiRequest;
use crate::scripting::Script;

/// A folder containing requests and other folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier
    #[serde(default = "generate_id")]
    pub id: String,
    /// Folder name
    pub name: String,
    /// Items in this folder
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Folder-level variables (environment scope)
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Folder-level scripts
    #[serde(default)]
    pub scripts: Vec<Script>,
}

impl Folder {
    /// Creates a new empty folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            items: Vec::new(),
            variables: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// Adds a child item.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<CollectionItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Adds a script.
    #[must_use]
    pub fn with_script(mut self, script: Script) -> Self {
        self.scripts.push(script);
        self
    }
}

/// An item in a collection (either a folder or a request).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollectionItem {
    /// A folder containing other items
    Folder(Folder),
    /// A request definition
    Request(ApiRequest),
}

impl CollectionItem {
    /// Returns the ID of this item.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(f) => &f.id,
            Self::Request(r) => &r.id,
        }
    }

    /// Returns the name of this item.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(f) => &f.name,
            Self::Request(r) => &r.name,
        }
    }
}

impl From<Folder> for CollectionItem {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

impl From<ApiRequest> for CollectionItem {
    fn from(request: ApiRequest) -> Self {
        Self::Request(request)
    }
}

/// A root-level collection. Same shape as [`Folder`] without the tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Unique identifier
    #[serde(default = "generate_id")]
    pub id: String,
    /// Collection name
    pub name: String,
    /// Items in this collection
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Collection-level variables
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// Collection-level scripts
    #[serde(default)]
    pub scripts: Vec<Script>,
}

impl Collection {
    /// Creates a new empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            items: Vec::new(),
            variables: Vec::new(),
            scripts: Vec::new(),
        }
    }

    /// Adds an item to the collection root.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<CollectionItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    /// Adds a script.
    #[must_use]
    pub fn with_script(mut self, script: Script) -> Self {
        self.scripts.push(script);
        self
    }

    /// Returns the total number of requests in the collection (recursive).
    #[must_use]
    pub fn request_count(&self) -> usize {
        fn count_in_items(items: &[CollectionItem]) -> usize {
            items.iter().fold(0, |acc, item| {
                acc + match item {
                    CollectionItem::Request(_) => 1,
                    CollectionItem::Folder(f) => count_in_items(&f.items),
                }
            })
        }
        count_in_items(&self.items)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new("New Collection")
    }
}

/// The whole document: every collection plus the global variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Root collections
    #[serde(default)]
    pub collections: Vec<Collection>,
    /// Project-wide variables (global scope)
    #[serde(default)]
    pub global_variables: Vec<Variable>,
}

impl Project {
    /// Creates an empty project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection.
    #[must_use]
    pub fn with_collection(mut self, collection: Collection) -> Self {
        self.collections.push(collection);
        self
    }

    /// Adds a global variable.
    #[must_use]
    pub fn with_global(mut self, variable: Variable) -> Self {
        self.global_variables.push(variable);
        self
    }
}
