//! Policy expansion: declarative policies into specification files.
//!
//! Direct policies render straight into the output tree; parent-scoped
//! policies go through a search-then-rewrite pass (see [`parent`]). Both
//! phases share the template registry and the file-naming rule, and both
//! treat any template or write failure as fatal: expansion errors are
//! author mistakes, not data errors.

pub mod direct;
pub mod parent;

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

use reaper_store::ArtifactStore;

use crate::error::{Result, RetentionError};
use crate::policy::{Entry, Policy, PolicyMode, PolicySet};
use crate::render::{ParentRewrite, SpecRenderer};

/// Options for one expansion run.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Root directory for generated specification files.
    pub output_dir: PathBuf,
}

/// Counts reported by one expansion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpandSummary {
    /// Policies expanded.
    pub policies: usize,
    /// Specification files written to the output tree.
    pub files_written: usize,
}

/// Expand every policy in the set into specification files.
///
/// Policies are processed in name order. The store is only consulted for
/// parent-scoped policies; direct policies never touch the network.
pub async fn expand_policies(
    policies: &PolicySet,
    store: &dyn ArtifactStore,
    rewrite: &ParentRewrite,
    options: &ExpandOptions,
) -> Result<ExpandSummary> {
    let mut summary = ExpandSummary::default();

    if policies.is_empty() {
        warn!("Policy set is empty; nothing to expand");
        return Ok(summary);
    }

    let mut renderer = SpecRenderer::new();

    for (name, policy) in policies.iter() {
        info!(policy = name, entries = policy.entries.len(), "Expanding policy");
        register_policy_template(&mut renderer, name, policy)?;

        let written = match policy.mode {
            PolicyMode::Direct => direct::expand(&renderer, name, policy, options)?,
            PolicyMode::ParentScoped => {
                parent::resolve(&renderer, name, policy, store, rewrite, options).await?
            }
        };

        summary.policies += 1;
        summary.files_written += written;
    }

    info!(
        policies = summary.policies,
        files = summary.files_written,
        "Expansion finished"
    );
    Ok(summary)
}

fn register_policy_template(
    renderer: &mut SpecRenderer,
    name: &str,
    policy: &Policy,
) -> Result<()> {
    let text =
        fs::read_to_string(&policy.template).map_err(|source| RetentionError::Configuration {
            reason: format!(
                "policy {name}: cannot read template {}: {source}",
                policy.template.display()
            ),
        })?;
    renderer.register(name, &text)
}

/// Output file name for one entry.
///
/// `<entry[nameProperty]>-<index>.json` when the property is set and the
/// entry carries a non-empty scalar under it; `<policyName>-<index>.json`
/// otherwise.
pub(crate) fn spec_file_name(
    policy_name: &str,
    name_property: Option<&str>,
    entry: &Entry,
    index: usize,
) -> String {
    if let Some(property) = name_property {
        if let Some(stem) = entry.get(property).and_then(scalar_stem) {
            return format!("{stem}-{index}.json");
        }
    }
    format!("{policy_name}-{index}.json")
}

fn scalar_stem(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
