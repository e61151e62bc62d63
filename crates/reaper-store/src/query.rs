//! Store-agnostic query and result types.
//!
//! These are the wire shapes shared by generated specification files and the
//! store client: a `SearchQuery` scopes one container and narrows it with a
//! path pattern and/or a structured predicate tree.

use serde::{Deserialize, Serialize};

/// One item held by the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreItem {
    /// Container (repository) the item lives in.
    pub container: String,

    /// Path of the item relative to its container root.
    pub path: String,
}

impl StoreItem {
    /// Create an item from a container and a relative path.
    pub fn new(container: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: path.into(),
        }
    }

    /// Final path segment (the item's file name).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Structured predicate tree over item fields.
///
/// Serialized without a tag: a leaf is `{"field": .., "value": ..}`, the
/// combinators are `{"all": [..]}` and `{"any": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    /// Field equals value.
    Eq { field: String, value: String },

    /// Every child predicate matches.
    All { all: Vec<Predicate> },

    /// At least one child predicate matches.
    Any { any: Vec<Predicate> },
}

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A single search clause: one container scope plus narrowing filters.
///
/// `limit == 0` means unbounded; `offset` skips leading results after
/// sorting. Both are applied server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Container (repository) to search.
    pub container: String,

    /// Optional path pattern; `*` matches any run of characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Optional structured predicate tree.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<Predicate>,

    /// Whether the search descends into sub-paths.
    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// Fields to sort by, in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_by: Vec<String>,

    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortOrder,

    /// Results to skip after sorting.
    #[serde(default)]
    pub offset: u64,

    /// Maximum results to return (0 = unbounded).
    #[serde(default)]
    pub limit: u64,
}

fn default_recursive() -> bool {
    true
}

impl SearchQuery {
    /// Create a recursive, unfiltered query over one container.
    pub fn container(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: None,
            predicate: None,
            recursive: true,
            sort_by: Vec::new(),
            sort_order: SortOrder::default(),
            offset: 0,
            limit: 0,
        }
    }

    /// Set the path pattern.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the structured predicate.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}
