//! In-memory fakes for the store traits (testing only)
//!
//! Provides `MemoryStore`, an [`ArtifactStore`] backed by a `Vec` of seeded
//! items, with call recording and error injection. Query evaluation here is
//! a test approximation, not the store's query language.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::query::{Predicate, SearchQuery, SortOrder, StoreItem};
use crate::traits::{ArtifactStore, ResultSet};

/// In-memory artifact store.
///
/// Records every search query and delete batch it receives, so tests can
/// assert on exactly what the engine asked for.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Vec<StoreItem>>,
    searches: Mutex<Vec<SearchQuery>>,
    deletes: Mutex<Vec<Vec<StoreItem>>>,
    search_fault: Mutex<Option<String>>,
    delete_fault: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with items.
    pub fn with_items(items: Vec<StoreItem>) -> Self {
        MemoryStore {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    /// Add one item to the store.
    pub fn seed(&self, container: &str, path: &str) {
        self.items
            .lock()
            .unwrap()
            .push(StoreItem::new(container, path));
    }

    /// Make every subsequent search fail with the given reason.
    pub fn fail_searches(&self, reason: &str) {
        *self.search_fault.lock().unwrap() = Some(reason.to_string());
    }

    /// Make every subsequent delete fail with the given reason.
    pub fn fail_deletes(&self, reason: &str) {
        *self.delete_fault.lock().unwrap() = Some(reason.to_string());
    }

    /// Queries received so far, in call order.
    pub fn search_log(&self) -> Vec<SearchQuery> {
        self.searches.lock().unwrap().clone()
    }

    /// Delete batches received so far, in call order.
    pub fn delete_log(&self) -> Vec<Vec<StoreItem>> {
        self.deletes.lock().unwrap().clone()
    }

    /// Number of delete calls received (faulted calls included).
    pub fn delete_count(&self) -> usize {
        self.deletes.lock().unwrap().len()
    }

    /// Items still present in the store.
    pub fn remaining(&self) -> Vec<StoreItem> {
        self.items.lock().unwrap().clone()
    }

    fn matches(query: &SearchQuery, item: &StoreItem) -> bool {
        if item.container != query.container {
            return false;
        }
        if let Some(pattern) = &query.path {
            if !wildcard_match(pattern, &item.path, query.recursive) {
                return false;
            }
        }
        if let Some(predicate) = &query.predicate {
            if !predicate_matches(predicate, item) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn search(&self, query: &SearchQuery) -> StoreResult<ResultSet> {
        self.searches.lock().unwrap().push(query.clone());

        if let Some(reason) = self.search_fault.lock().unwrap().clone() {
            return Err(StoreError::Status {
                status: 502,
                body: reason,
            });
        }

        let mut matched: Vec<StoreItem> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| Self::matches(query, item))
            .cloned()
            .collect();

        if let Some(field) = query.sort_by.first() {
            let field = field.clone();
            matched.sort_by(|a, b| field_value(a, &field).cmp(field_value(b, &field)));
            if query.sort_order == SortOrder::Desc {
                matched.reverse();
            }
        }

        let skipped = matched.into_iter().skip(query.offset as usize);
        let matched: Vec<StoreItem> = if query.limit > 0 {
            skipped.take(query.limit as usize).collect()
        } else {
            skipped.collect()
        };

        Ok(ResultSet::new(matched))
    }

    async fn delete(&self, results: ResultSet) -> StoreResult<u64> {
        let batch = results.into_items();
        self.deletes.lock().unwrap().push(batch.clone());

        if let Some(reason) = self.delete_fault.lock().unwrap().clone() {
            return Err(StoreError::Status {
                status: 502,
                body: reason,
            });
        }

        // Deleting an already-deleted item is a success; only count removals.
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| !batch.contains(item));
        Ok((before - items.len()) as u64)
    }
}

fn field_value<'a>(item: &'a StoreItem, field: &str) -> &'a str {
    match field {
        "container" => &item.container,
        "name" => item.name(),
        _ => &item.path,
    }
}

fn predicate_matches(predicate: &Predicate, item: &StoreItem) -> bool {
    match predicate {
        Predicate::Eq { field, value } => match field.as_str() {
            "container" => item.container == *value,
            "path" => item.path == *value,
            "name" => item.name() == value,
            _ => false,
        },
        Predicate::All { all } => all.iter().all(|child| predicate_matches(child, item)),
        Predicate::Any { any } => any.iter().any(|child| predicate_matches(child, item)),
    }
}

/// Byte-wise wildcard match where `*` matches any run of characters.
/// When `cross_separators` is false, `*` stops at `/`.
fn wildcard_match(pattern: &str, input: &str, cross_separators: bool) -> bool {
    fn step(pattern: &[u8], input: &[u8], cross: bool) -> bool {
        match pattern.split_first() {
            None => input.is_empty(),
            Some((b'*', rest)) => {
                if step(rest, input, cross) {
                    return true;
                }
                for (index, byte) in input.iter().enumerate() {
                    if !cross && *byte == b'/' {
                        return false;
                    }
                    if step(rest, &input[index + 1..], cross) {
                        return true;
                    }
                }
                false
            }
            Some((expected, rest)) => {
                input.first() == Some(expected) && step(rest, &input[1..], cross)
            }
        }
    }
    step(pattern.as_bytes(), input.as_bytes(), cross_separators)
}
