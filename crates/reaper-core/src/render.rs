//! Strict template rendering.
//!
//! Templates are parsed once per distinct name and rendered against entry
//! records. Rendering is strict: a template referencing a field the entry
//! does not carry fails the render. A typo in a policy template must surface
//! as a build-time error, never as a malformed specification that gets
//! executed against production data.

use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use serde_json::json;

use crate::error::{Result, RetentionError};

/// Template registry with strict missing-key semantics.
pub struct SpecRenderer {
    registry: Handlebars<'static>,
}

impl SpecRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        // Rendered documents are JSON, not HTML.
        registry.register_escape_fn(no_escape);
        SpecRenderer { registry }
    }

    /// Parse and register a template under `name`. Parsing happens once;
    /// later renders reuse the parsed form.
    pub fn register(&mut self, name: &str, text: &str) -> Result<()> {
        self.registry
            .register_template_string(name, text)
            .map_err(|source| RetentionError::TemplateParse {
                name: name.to_string(),
                source: Box::new(source),
            })
    }

    /// Whether a template is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Render a registered template against a context.
    ///
    /// Pure: same template and context produce byte-identical output. The
    /// caller persists the result.
    pub fn render<C: Serialize>(&self, name: &str, context: &C) -> Result<String> {
        self.registry
            .render(name, context)
            .map_err(|source| RetentionError::TemplateRender {
                name: name.to_string(),
                source: Box::new(source),
            })
    }
}

impl Default for SpecRenderer {
    fn default() -> Self {
        Self::new()
    }
}

const PARENT_REWRITE_NAME: &str = "builtin-parent-rewrite";

const PARENT_REWRITE_TEXT: &str = r#"{
  "queries": [
    {
      "container": "{{container}}",
      "match": {
        "any": [
          {{#each paths}}{ "field": "path", "value": "{{this}}" }{{#unless @last}},
          {{/unless}}{{/each}}
        ]
      },
      "recursive": false
    }
  ]
}
"#;

/// The built-in parent-rewrite template.
///
/// Expresses "delete the items whose container equals X and whose path is
/// one of these" — the second phase of parent-scoped resolution. Constructed
/// once per run and passed to the resolver as a value, so tests can swap it.
pub struct ParentRewrite {
    renderer: SpecRenderer,
}

impl ParentRewrite {
    pub fn new() -> Result<Self> {
        let mut renderer = SpecRenderer::new();
        renderer.register(PARENT_REWRITE_NAME, PARENT_REWRITE_TEXT)?;
        Ok(ParentRewrite { renderer })
    }

    /// Render a one-clause specification covering `paths` inside
    /// `container`. `paths` must be non-empty.
    pub fn render(&self, container: &str, paths: &[String]) -> Result<String> {
        self.renderer.render(
            PARENT_REWRITE_NAME,
            &json!({ "container": container, "paths": paths }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_render_is_pure() {
        let mut renderer = SpecRenderer::new();
        renderer.register("t", r#"{"v": {{count}}}"#).unwrap();

        let context = json!({"count": 7});
        let first = renderer.render("t", &context).unwrap();
        let second = renderer.render("t", &context).unwrap();
        assert_eq!(first, r#"{"v": 7}"#);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_field_fails_render() {
        let mut renderer = SpecRenderer::new();
        renderer.register("t", r#"{"v": "{{missing}}"}"#).unwrap();

        let err = renderer.render("t", &json!({"present": 1})).unwrap_err();
        assert!(matches!(err, RetentionError::TemplateRender { .. }));
    }

    #[test]
    fn test_malformed_template_fails_parse() {
        let mut renderer = SpecRenderer::new();
        let err = renderer.register("t", "{{#each entries}} no close").unwrap_err();
        assert!(matches!(err, RetentionError::TemplateParse { .. }));
    }

    #[test]
    fn test_values_are_not_html_escaped() {
        let mut renderer = SpecRenderer::new();
        renderer.register("t", r#"{"path": "{{path}}"}"#).unwrap();

        let rendered = renderer
            .render("t", &json!({"path": "a/b&c/d"}))
            .unwrap();
        assert_eq!(rendered, r#"{"path": "a/b&c/d"}"#);
    }

    #[test]
    fn test_parent_rewrite_emits_valid_spec() {
        let rewrite = ParentRewrite::new().unwrap();
        let rendered = rewrite
            .render(
                "docker-local",
                &["team/app/1.0".to_string(), "team/app/1.1".to_string()],
            )
            .unwrap();

        let document: Value = serde_json::from_str(&rendered).unwrap();
        let queries = document["queries"].as_array().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0]["container"], "docker-local");
        assert_eq!(queries[0]["recursive"], false);

        let any = queries[0]["match"]["any"].as_array().unwrap();
        assert_eq!(any.len(), 2);
        assert_eq!(any[0]["field"], "path");
        assert_eq!(any[0]["value"], "team/app/1.0");
        assert_eq!(any[1]["value"], "team/app/1.1");
    }

    #[test]
    fn test_parent_rewrite_single_path_has_no_trailing_comma() {
        let rewrite = ParentRewrite::new().unwrap();
        let rendered = rewrite
            .render("generic", &["only/one".to_string()])
            .unwrap();
        let document: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(document["queries"][0]["match"]["any"].as_array().unwrap().len(), 1);
    }
}
