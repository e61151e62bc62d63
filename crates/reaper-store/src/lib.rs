//! Artifact store collaborator for reaper
//!
//! Defines the store-agnostic query shape and the two operations the
//! retention engine consumes:
//! - `search`: resolve a query into a finite set of matched items
//! - `delete`: remove a previously resolved item set
//!
//! The store's own query language is out of scope; queries travel as typed
//! data and are evaluated server-side. In-memory fakes are provided for
//! testing via the `fakes` module.

pub mod client;
pub mod error;
pub mod fakes;
pub mod query;
pub mod traits;

pub use client::{HttpArtifactStore, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use query::{Predicate, SearchQuery, SortOrder, StoreItem};
pub use traits::{ArtifactStore, ResultSet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
