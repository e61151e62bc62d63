//! Parent-scope resolution.
//!
//! Some policies do not mean "delete what this query matches" but "delete
//! the *containers* of what it matches" — whole module or version
//! directories whose leaf artifacts are all due for removal. Resolution is
//! two-phase: render the entry into a search specification, resolve it
//! against the store, then rewrite the grouped matches through the built-in
//! parent-rewrite template into per-container deletion specifications.

use std::collections::{BTreeSet, HashMap};
use std::fs;

use tracing::debug;

use reaper_store::ArtifactStore;

use crate::error::Result;
use crate::expand::{spec_file_name, ExpandOptions};
use crate::policy::Policy;
use crate::render::{ParentRewrite, SpecRenderer};
use crate::spec::parse_spec_file;

/// Search matches grouped by container, deduplicated by exact
/// `(container, path)` pair.
///
/// Iteration order across containers is unspecified; consumers needing a
/// stable container order must sort. Paths within a container come out
/// sorted, so rendered output per container is deterministic.
#[derive(Debug, Default)]
pub struct MatchedContainerPaths {
    groups: HashMap<String, BTreeSet<String>>,
}

impl MatchedContainerPaths {
    /// Record one matched item. Duplicate pairs collapse.
    pub fn record(&mut self, container: &str, path: &str) {
        self.groups
            .entry(container.to_string())
            .or_default()
            .insert(path.to_string());
    }

    /// Whether nothing was matched.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of containers with at least one matched path.
    pub fn container_count(&self) -> usize {
        self.groups.len()
    }

    /// Total deduplicated `(container, path)` pairs.
    pub fn path_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }

    /// Consume the grouping. No inter-container ordering is guaranteed;
    /// every yielded group has at least one path.
    pub fn into_groups(self) -> impl Iterator<Item = (String, Vec<String>)> {
        self.groups
            .into_iter()
            .map(|(container, paths)| (container, paths.into_iter().collect()))
    }
}

/// Resolve a parent-scoped policy into per-container deletion specs.
///
/// Store failures are fatal here: the rewrite must never run against a
/// partial match set. Containers with no matches produce no output file.
pub(crate) async fn resolve(
    renderer: &SpecRenderer,
    name: &str,
    policy: &Policy,
    store: &dyn ArtifactStore,
    rewrite: &ParentRewrite,
    options: &ExpandOptions,
) -> Result<usize> {
    // Phase-1 search specs land in a scratch directory, outside the output
    // tree an operator reviews; the directory is removed on drop.
    let scratch = tempfile::tempdir()?;
    let mut written = 0;

    for (index, entry) in policy.entries.iter().enumerate() {
        let document = renderer.render(name, entry)?;
        let file_name = spec_file_name(name, policy.name_property.as_deref(), entry, index);
        let scratch_path = scratch.path().join(&file_name);
        fs::write(&scratch_path, &document)?;

        let descriptors = parse_spec_file(&scratch_path)?;

        let mut matched = MatchedContainerPaths::default();
        for descriptor in &descriptors {
            let results = store.search(&descriptor.query).await?;
            for item in results {
                matched.record(&item.container, &item.path);
            }
        }

        if matched.is_empty() {
            debug!(policy = name, index, "Entry matched nothing; no spec emitted");
            continue;
        }

        debug!(
            policy = name,
            index,
            containers = matched.container_count(),
            paths = matched.path_count(),
            "Rewriting matches into parent deletions"
        );

        for (container, paths) in matched.into_groups() {
            let rewritten = rewrite.render(&container, &paths)?;
            let container_dir = options.output_dir.join(name).join(&container);
            fs::create_dir_all(&container_dir)?;
            let path = container_dir.join(&file_name);
            fs::write(&path, rewritten)?;
            debug!(path = %path.display(), "Wrote parent deletion specification");
            written += 1;
        }
    }

    Ok(written)
}
