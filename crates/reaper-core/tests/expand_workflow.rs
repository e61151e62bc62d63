//! Integration tests for policy expansion with the in-memory store fake.

use std::fs;
use std::path::{Path, PathBuf};

use reaper_core::{
    expand_policies, ExpandOptions, ParentRewrite, PolicySet, RetentionError,
};
use reaper_store::fakes::MemoryStore;

struct Fixture {
    _dir: tempfile::TempDir,
    config_dir: PathBuf,
    output_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join("config");
        let output_dir = dir.path().join("out");
        fs::create_dir_all(&config_dir).unwrap();
        Fixture {
            _dir: dir,
            config_dir,
            output_dir,
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.config_dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn options(&self) -> ExpandOptions {
        ExpandOptions {
            output_dir: self.output_dir.clone(),
        }
    }
}

async fn expand(
    fixture: &Fixture,
    config: &Path,
    store: &MemoryStore,
) -> Result<reaper_core::ExpandSummary, RetentionError> {
    let policies = PolicySet::load(config).unwrap();
    let rewrite = ParentRewrite::new().unwrap();
    expand_policies(&policies, store, &rewrite, &fixture.options()).await
}

#[tokio::test]
async fn test_direct_expansion_end_to_end() {
    let fixture = Fixture::new();
    fixture.write("t.tmpl", r#"{"v": {{a}}}"#);
    let config = fixture.write(
        "retention.json",
        r#"{"p1": {"template": "t.tmpl", "deleteParent": false, "nameProperty": "", "entries": [{"a": 1}, {"a": 2}]}}"#,
    );

    let store = MemoryStore::new();
    let summary = expand(&fixture, &config, &store).await.unwrap();
    assert_eq!(summary.policies, 1);
    assert_eq!(summary.files_written, 2);

    let first = fs::read_to_string(fixture.output_dir.join("p1/p1-0.json")).unwrap();
    let second = fs::read_to_string(fixture.output_dir.join("p1/p1-1.json")).unwrap();
    assert_eq!(first, r#"{"v": 1}"#);
    assert_eq!(second, r#"{"v": 2}"#);

    // Direct policies never touch the store.
    assert!(store.search_log().is_empty());
}

#[tokio::test]
async fn test_name_property_drives_file_names() {
    let fixture = Fixture::new();
    fixture.write("t.tmpl", r#"{"id": "{{id}}"}"#);
    let config = fixture.write(
        "retention.json",
        r#"{"p1": {"template": "t.tmpl", "nameProperty": "id", "entries": [
            {"id": "alpha"},
            {"id": "beta"}
        ]}}"#,
    );
    expand(&fixture, &config, &MemoryStore::new()).await.unwrap();

    assert!(fixture.output_dir.join("p1/alpha-0.json").is_file());
    assert!(fixture.output_dir.join("p1/beta-1.json").is_file());
}

#[tokio::test]
async fn test_strict_render_aborts_expansion() {
    let fixture = Fixture::new();
    fixture.write("t.tmpl", r#"{"v": {{typo}}}"#);
    let config = fixture.write(
        "retention.json",
        r#"{"p1": {"template": "t.tmpl", "entries": [{"a": 1}]}}"#,
    );

    let err = expand(&fixture, &config, &MemoryStore::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RetentionError::TemplateRender { .. }));
}

#[tokio::test]
async fn test_parent_scoped_expansion_groups_by_container() {
    let fixture = Fixture::new();
    // The policy template is a search spec over whatever the entry names.
    fixture.write(
        "modules.tmpl",
        r#"{"queries": [{"container": "{{repo}}", "path": "{{prefix}}/*"}]}"#,
    );
    let config = fixture.write(
        "retention.json",
        r#"{"modules": {"template": "modules.tmpl", "deleteParent": true, "entries": [
            {"repo": "libs-release", "prefix": "com/acme"}
        ]}}"#,
    );

    let store = MemoryStore::new();
    store.seed("libs-release", "com/acme/app/1.0/app-1.0.jar");
    store.seed("libs-release", "com/acme/app/1.0/app-1.0.jar"); // duplicate result
    store.seed("libs-release", "com/acme/app/1.1/app-1.1.jar");
    store.seed("other-repo", "com/acme/ignored.jar"); // different container, unmatched

    let summary = expand(&fixture, &config, &store).await.unwrap();
    assert_eq!(summary.files_written, 1);

    let spec_path = fixture
        .output_dir
        .join("modules/libs-release/modules-0.json");
    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&spec_path).unwrap()).unwrap();

    let clause = &document["queries"][0];
    assert_eq!(clause["container"], "libs-release");
    assert_eq!(clause["recursive"], false);

    // Deduplicated: the doubled search result appears once.
    let any = clause["match"]["any"].as_array().unwrap();
    assert_eq!(any.len(), 2);
}

#[tokio::test]
async fn test_parent_scoped_entry_with_no_matches_emits_nothing() {
    let fixture = Fixture::new();
    fixture.write(
        "modules.tmpl",
        r#"{"queries": [{"container": "{{repo}}", "path": "nothing/*"}]}"#,
    );
    let config = fixture.write(
        "retention.json",
        r#"{"modules": {"template": "modules.tmpl", "deleteParent": true, "entries": [
            {"repo": "empty-repo"}
        ]}}"#,
    );

    let store = MemoryStore::new();
    let summary = expand(&fixture, &config, &store).await.unwrap();
    assert_eq!(summary.files_written, 0);
    assert!(!fixture.output_dir.join("modules").exists() ||
        fs::read_dir(fixture.output_dir.join("modules")).unwrap().next().is_none());
}

#[tokio::test]
async fn test_parent_scoped_store_failure_is_fatal() {
    let fixture = Fixture::new();
    fixture.write(
        "modules.tmpl",
        r#"{"queries": [{"container": "{{repo}}"}]}"#,
    );
    let config = fixture.write(
        "retention.json",
        r#"{"modules": {"template": "modules.tmpl", "deleteParent": true, "entries": [
            {"repo": "r"}
        ]}}"#,
    );

    let store = MemoryStore::new();
    store.fail_searches("connection refused");

    let err = expand(&fixture, &config, &store).await.unwrap_err();
    assert!(matches!(err, RetentionError::Store(_)));
    // Nothing was written for the failed entry.
    assert!(!fixture.output_dir.join("modules").exists());
}

#[tokio::test]
async fn test_zero_entry_policy_is_not_an_error() {
    let fixture = Fixture::new();
    fixture.write("t.tmpl", "{}");
    let config = fixture.write(
        "retention.json",
        r#"{"p1": {"template": "t.tmpl", "entries": []}}"#,
    );

    let summary = expand(&fixture, &config, &MemoryStore::new()).await.unwrap();
    assert_eq!(summary.policies, 1);
    assert_eq!(summary.files_written, 0);
}
