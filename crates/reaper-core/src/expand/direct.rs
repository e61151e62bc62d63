//! Direct expansion for policies that delete exactly what they match.

use std::fs;

use tracing::debug;

use crate::error::Result;
use crate::expand::{spec_file_name, ExpandOptions};
use crate::policy::Policy;
use crate::render::SpecRenderer;

/// Render each entry of `policy` into `<output>/<name>/<file>`.
///
/// The document is rendered fully before anything is written, so a render
/// failure never leaves a half-written specification behind.
pub(crate) fn expand(
    renderer: &SpecRenderer,
    name: &str,
    policy: &Policy,
    options: &ExpandOptions,
) -> Result<usize> {
    let policy_dir = options.output_dir.join(name);
    fs::create_dir_all(&policy_dir)?;

    let mut written = 0;
    for (index, entry) in policy.entries.iter().enumerate() {
        let document = renderer.render(name, entry)?;
        let file_name = spec_file_name(name, policy.name_property.as_deref(), entry, index);
        let path = policy_dir.join(&file_name);
        fs::write(&path, document)?;
        debug!(path = %path.display(), "Wrote specification");
        written += 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Entry, PolicyMode};
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn entry_from(value: Value) -> Entry {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    fn policy_with(entries: Vec<Entry>, name_property: Option<&str>) -> Policy {
        Policy {
            template: PathBuf::from("unused.tmpl"),
            mode: PolicyMode::Direct,
            name_property: name_property.map(str::to_string),
            entries,
        }
    }

    #[test]
    fn test_expand_writes_one_file_per_entry() {
        let out = tempfile::tempdir().unwrap();
        let mut renderer = SpecRenderer::new();
        renderer.register("p1", r#"{"v": {{a}}}"#).unwrap();

        let policy = policy_with(
            vec![entry_from(json!({"a": 1})), entry_from(json!({"a": 2}))],
            None,
        );
        let options = ExpandOptions {
            output_dir: out.path().to_path_buf(),
        };

        let written = expand(&renderer, "p1", &policy, &options).unwrap();
        assert_eq!(written, 2);

        let first = fs::read_to_string(out.path().join("p1/p1-0.json")).unwrap();
        let second = fs::read_to_string(out.path().join("p1/p1-1.json")).unwrap();
        assert_eq!(first, r#"{"v": 1}"#);
        assert_eq!(second, r#"{"v": 2}"#);
    }

    #[test]
    fn test_expand_zero_entries_writes_nothing() {
        let out = tempfile::tempdir().unwrap();
        let mut renderer = SpecRenderer::new();
        renderer.register("p1", "{}").unwrap();

        let policy = policy_with(Vec::new(), None);
        let options = ExpandOptions {
            output_dir: out.path().to_path_buf(),
        };

        let written = expand(&renderer, "p1", &policy, &options).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_render_failure_writes_no_file() {
        let out = tempfile::tempdir().unwrap();
        let mut renderer = SpecRenderer::new();
        renderer.register("p1", r#"{"v": {{missing}}}"#).unwrap();

        let policy = policy_with(vec![entry_from(json!({"a": 1}))], None);
        let options = ExpandOptions {
            output_dir: out.path().to_path_buf(),
        };

        expand(&renderer, "p1", &policy, &options).unwrap_err();
        assert!(fs::read_dir(out.path().join("p1")).unwrap().next().is_none());
    }
}
