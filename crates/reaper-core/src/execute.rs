//! Retention execution.
//!
//! Discovers generated specification files, parses each into delete
//! descriptors, and runs every descriptor through search-then-delete. One
//! bad or stale specification never blocks the rest: parse, search, and
//! delete failures are recorded per unit of work, the pass always finishes,
//! and the recorded failures surface afterwards as one aggregate error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use reaper_store::ArtifactStore;

use crate::discover::find_spec_files;
use crate::error::{Result, RetentionError, RunFailure};
use crate::spec::{parse_spec_file, DeleteDescriptor};

/// File suffix the execution phase looks for during discovery.
pub const SPEC_SUFFIX: &str = ".json";

/// Options for one execution run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Recurse into subdirectories during discovery.
    pub recursive: bool,

    /// Search but never delete.
    pub dry_run: bool,
}

/// Lifecycle of one descriptor within a run.
///
/// `Deleted`, `QueryFailed` and `DeleteFailed` are terminal; a dry run stops
/// at `Queried`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorState {
    Pending,
    Queried,
    Deleted,
    QueryFailed,
    DeleteFailed,
}

/// Outcome of one descriptor.
#[derive(Debug, Clone)]
pub struct DescriptorOutcome {
    /// Specification file the descriptor came from.
    pub spec_path: PathBuf,

    /// Clause position within that file.
    pub clause: usize,

    /// Where the descriptor's state machine stopped.
    pub state: DescriptorState,

    /// Items the search resolved (0 until `Queried`).
    pub matched: usize,

    /// Items the store reported deleted.
    pub deleted: u64,

    /// Failure reason, for the two failed terminal states.
    pub error: Option<String>,
}

/// Aggregate result of one execution run.
#[derive(Debug)]
pub struct RunReport {
    /// Correlation id for this run's log lines.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Per-descriptor outcomes, in processing order.
    pub outcomes: Vec<DescriptorOutcome>,

    /// Recorded failures (parse, search, delete), in processing order.
    pub failures: Vec<RunFailure>,

    /// Total items deleted across all descriptors.
    pub deleted: u64,
}

impl RunReport {
    /// Whether the run finished without a single recorded failure.
    pub fn ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// Descriptors that reached `Deleted`.
    pub fn deleted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.state == DescriptorState::Deleted)
            .count()
    }

    /// Convert recorded failures into the single aggregate error.
    pub fn into_result(self) -> Result<RunReport> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(RetentionError::RunFailed {
                failures: self.failures,
            })
        }
    }
}

/// Execute every specification under `root`.
///
/// Discovery failure is fatal (there is nothing to process); everything
/// after that is isolated per file and per descriptor. The full pass always
/// runs to completion before the report is returned.
pub async fn execute(
    store: &dyn ArtifactStore,
    root: &Path,
    options: &ExecuteOptions,
) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    info!(%run_id, root = %root.display(), dry_run = options.dry_run, "Starting retention run");

    let files = find_spec_files(root, SPEC_SUFFIX, options.recursive)?;
    if files.is_empty() {
        warn!("Found no specification files");
    } else {
        info!(count = files.len(), "Found specification files");
    }

    let mut outcomes: Vec<DescriptorOutcome> = Vec::new();
    let mut failures: Vec<RunFailure> = Vec::new();
    let mut deleted: u64 = 0;

    for (position, file) in files.iter().enumerate() {
        info!("{}/{}: {}", position + 1, files.len(), file.display());

        let descriptors = match parse_spec_file(file) {
            Ok(descriptors) => descriptors,
            Err(err) => {
                warn!(path = %file.display(), %err, "Skipping unparseable specification");
                failures.push(RunFailure {
                    spec_path: file.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };

        for descriptor in &descriptors {
            let outcome = run_descriptor(store, file, descriptor, options).await;
            if let Some(reason) = &outcome.error {
                failures.push(RunFailure {
                    spec_path: file.clone(),
                    reason: format!("clause {}: {reason}", outcome.clause),
                });
            }
            deleted += outcome.deleted;
            outcomes.push(outcome);
        }
    }

    let finished_at = Utc::now();
    if failures.is_empty() {
        info!(%run_id, deleted, "Retention run finished");
    } else {
        warn!(%run_id, deleted, failures = failures.len(), "Retention run finished with failures");
    }

    Ok(RunReport {
        run_id,
        started_at,
        finished_at,
        outcomes,
        failures,
        deleted,
    })
}

async fn run_descriptor(
    store: &dyn ArtifactStore,
    spec_path: &Path,
    descriptor: &DeleteDescriptor,
    options: &ExecuteOptions,
) -> DescriptorOutcome {
    let mut outcome = DescriptorOutcome {
        spec_path: spec_path.to_path_buf(),
        clause: descriptor.clause,
        state: DescriptorState::Pending,
        matched: 0,
        deleted: 0,
        error: None,
    };

    // The result set lives only for this descriptor; it is released on
    // every exit path below.
    let results = match store.search(&descriptor.query).await {
        Ok(results) => results,
        Err(err) => {
            outcome.state = DescriptorState::QueryFailed;
            outcome.error = Some(err.to_string());
            return outcome;
        }
    };

    outcome.state = DescriptorState::Queried;
    outcome.matched = results.len();

    if options.dry_run {
        info!(
            clause = descriptor.clause,
            matched = outcome.matched,
            "Dry run; delete suppressed"
        );
        return outcome;
    }

    match store.delete(results).await {
        Ok(count) => {
            outcome.state = DescriptorState::Deleted;
            outcome.deleted = count;
        }
        Err(err) => {
            outcome.state = DescriptorState::DeleteFailed;
            outcome.error = Some(err.to_string());
        }
    }

    outcome
}
