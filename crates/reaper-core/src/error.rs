//! Error taxonomy for the retention engine.
//!
//! Author mistakes (configuration, templates) are fatal-fast: the generated
//! output cannot be trusted. Failures hit while executing already-generated
//! specifications are recorded per unit of work and surfaced once, together,
//! as [`RetentionError::RunFailed`].

use std::path::PathBuf;

use reaper_store::StoreError;

/// One recorded, non-fatal failure from the execution phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// Specification file the failure originated from.
    pub spec_path: PathBuf,
    /// Underlying reason, human-readable.
    pub reason: String,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.spec_path.display(), self.reason)
    }
}

/// Retention engine errors.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("invalid policy configuration: {reason}")]
    Configuration { reason: String },

    #[error("failed to parse template {name}: {source}")]
    TemplateParse {
        name: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("failed to render template {name}: {source}")]
    TemplateRender {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cannot discover specification files under {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse specification file {path}: {reason}")]
    SpecParse { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(
        "retention run recorded {} failure(s):\n{}",
        .failures.len(),
        format_failures(.failures)
    )]
    RunFailed { failures: Vec<RunFailure> },
}

fn format_failures(failures: &[RunFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  {failure}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for retention engine operations.
pub type Result<T> = std::result::Result<T, RetentionError>;
