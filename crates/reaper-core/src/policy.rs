//! Retention policy model and configuration loading.
//!
//! A policy document maps policy names to `{template, deleteParent,
//! nameProperty, entries}`. The `deleteParent` boolean is resolved once at
//! load time into [`PolicyMode`]; nothing downstream branches on the raw
//! flag again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, RetentionError};

/// One entry record: the rendering context for a single template render.
pub type Entry = Map<String, Value>;

/// How a policy's entries are resolved into specification files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    /// Render the template straight into the output tree.
    Direct,

    /// Render into a search specification, resolve it against the store,
    /// then rewrite the matches into per-container parent deletions.
    ParentScoped,
}

/// One named retention policy.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Template file, absolute after loading.
    pub template: PathBuf,

    /// Expansion mode, resolved at load time.
    pub mode: PolicyMode,

    /// Entry field used to derive output file names, if any.
    pub name_property: Option<String>,

    /// Ordered entry records.
    pub entries: Vec<Entry>,
}

/// On-disk shape of one policy in the configuration document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PolicyDocument {
    template: PathBuf,
    #[serde(default)]
    delete_parent: bool,
    #[serde(default)]
    name_property: Option<String>,
    #[serde(default)]
    entries: Vec<Entry>,
}

/// The full policy set for one run. Immutable after loading; iteration is
/// name-ordered for reproducible output and error reporting.
#[derive(Debug, Default)]
pub struct PolicySet {
    policies: BTreeMap<String, Policy>,
}

impl PolicySet {
    /// Load a policy set from a JSON or TOML configuration file.
    ///
    /// Template paths are resolved against the configuration file's parent
    /// directory and must exist; a missing or unreadable template is a
    /// configuration error, surfaced before any expansion starts.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| RetentionError::Configuration {
            reason: format!("cannot read {}: {source}", path.display()),
        })?;

        let documents: BTreeMap<String, PolicyDocument> = match path
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some("json") => {
                serde_json::from_str(&raw).map_err(|source| RetentionError::Configuration {
                    reason: format!("malformed {}: {source}", path.display()),
                })?
            }
            Some("toml") | Some("tml") => {
                toml::from_str(&raw).map_err(|source| RetentionError::Configuration {
                    reason: format!("malformed {}: {source}", path.display()),
                })?
            }
            _ => {
                return Err(RetentionError::Configuration {
                    reason: format!(
                        "unsupported configuration format: {} (expected .json or .toml)",
                        path.display()
                    ),
                })
            }
        };

        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut policies = BTreeMap::new();

        for (name, document) in documents {
            let template = if document.template.is_absolute() {
                document.template
            } else {
                config_dir.join(&document.template)
            };

            if !template.is_file() {
                return Err(RetentionError::Configuration {
                    reason: format!(
                        "policy {name}: template {} does not exist",
                        template.display()
                    ),
                });
            }

            let mode = if document.delete_parent {
                PolicyMode::ParentScoped
            } else {
                PolicyMode::Direct
            };

            // An empty nameProperty means "not set".
            let name_property = document.name_property.filter(|property| !property.is_empty());

            debug!(
                policy = %name,
                template = %template.display(),
                ?mode,
                entries = document.entries.len(),
                "Loaded policy"
            );

            policies.insert(
                name,
                Policy {
                    template,
                    mode,
                    name_property,
                    entries: document.entries,
                },
            );
        }

        Ok(PolicySet { policies })
    }

    /// Number of policies in the set.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the set holds no policies.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Look up one policy by name.
    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    /// Iterate policies in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Policy)> {
        self.policies.iter().map(|(name, policy)| (name.as_str(), policy))
    }
}
