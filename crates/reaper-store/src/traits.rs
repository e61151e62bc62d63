//! Trait definitions for the artifact store collaborator.
//!
//! `ArtifactStore` is async and backend-agnostic; the retention engine only
//! ever talks through it, which keeps dry-run behavior and test fakes at the
//! same seam as the real HTTP client.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::query::{SearchQuery, StoreItem};

/// A resolved, finite set of search results.
///
/// The set is owned by whoever issued the search and released when dropped.
/// It is not restartable: feeding it to `delete` consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    items: Vec<StoreItem>,
}

impl ResultSet {
    /// Wrap a list of matched items.
    pub fn new(items: Vec<StoreItem>) -> Self {
        Self { items }
    }

    /// Number of matched items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the search matched nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow the matched items.
    pub fn items(&self) -> &[StoreItem] {
        &self.items
    }

    /// Consume the set, yielding the matched items.
    pub fn into_items(self) -> Vec<StoreItem> {
        self.items
    }
}

impl IntoIterator for ResultSet {
    type Item = StoreItem;
    type IntoIter = std::vec::IntoIter<StoreItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// The two operations the retention engine consumes.
///
/// Deleting an item that no longer exists is a success, not an error: two
/// runs racing over the same store must both be able to finish.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Resolve a query into the set of items it denotes.
    async fn search(&self, query: &SearchQuery) -> StoreResult<ResultSet>;

    /// Delete a previously resolved item set, returning the count actually
    /// removed. Deleting an empty set is a no-op success.
    async fn delete(&self, results: ResultSet) -> StoreResult<u64>;
}
