//! Reaper Core Library
//!
//! Turns declarative retention policies into concrete search/delete
//! specifications, and executes those specifications against a remote
//! artifact store with per-item failure isolation.
//!
//! The two phases are deliberately decoupled through specification files on
//! durable storage: everything the execution phase will delete exists as a
//! reviewable JSON document first.

pub mod discover;
pub mod error;
pub mod execute;
pub mod expand;
pub mod policy;
pub mod render;
pub mod spec;
pub mod telemetry;

pub use discover::find_spec_files;
pub use error::{Result, RetentionError, RunFailure};
pub use execute::{
    execute, DescriptorOutcome, DescriptorState, ExecuteOptions, RunReport, SPEC_SUFFIX,
};
pub use expand::parent::MatchedContainerPaths;
pub use expand::{expand_policies, ExpandOptions, ExpandSummary};
pub use policy::{Entry, Policy, PolicyMode, PolicySet};
pub use render::{ParentRewrite, SpecRenderer};
pub use spec::{parse_spec_file, DeleteDescriptor, SpecDocument};
pub use telemetry::init_tracing;

/// Reaper version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
