//! Generated specification documents.
//!
//! A specification document is the durable hand-off between the expansion
//! and execution phases: JSON with a `queries` array, each clause a full
//! [`SearchQuery`]. Parsing yields one [`DeleteDescriptor`] per clause.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use reaper_store::SearchQuery;

use crate::error::{Result, RetentionError};

/// On-disk shape of a specification document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecDocument {
    /// Search/delete clauses, in declaration order.
    pub queries: Vec<SearchQuery>,
}

/// The parsed, store-agnostic form of one clause from a specification
/// document.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDescriptor {
    /// Zero-based position of the clause within its document.
    pub clause: usize,

    /// The query denoting the item set to delete.
    pub query: SearchQuery,
}

/// Parse a specification file into its descriptors.
///
/// One document may declare any number of clauses; an empty `queries` array
/// parses to an empty descriptor list. A clause without a container is
/// rejected: it would denote the whole store.
pub fn parse_spec_file(path: &Path) -> Result<Vec<DeleteDescriptor>> {
    let raw = fs::read_to_string(path).map_err(|source| RetentionError::SpecParse {
        path: path.to_path_buf(),
        reason: source.to_string(),
    })?;

    let document: SpecDocument =
        serde_json::from_str(&raw).map_err(|source| RetentionError::SpecParse {
            path: path.to_path_buf(),
            reason: source.to_string(),
        })?;

    let descriptors: Vec<DeleteDescriptor> = document
        .queries
        .into_iter()
        .enumerate()
        .map(|(clause, query)| DeleteDescriptor { clause, query })
        .collect();

    for descriptor in &descriptors {
        if descriptor.query.container.is_empty() {
            return Err(RetentionError::SpecParse {
                path: path.to_path_buf(),
                reason: format!("clause {} has an empty container", descriptor.clause),
            });
        }
    }

    Ok(descriptors)
}
