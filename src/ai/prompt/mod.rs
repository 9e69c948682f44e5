//! Prompt Templates
//!
//! Built-in Markdown templates rendered with minijinja. Undefined variables
//! are errors, and a block tag alone on its line consumes that line.
//!
//! ## Templates
//!
//! - `plan`: research planning prompt (`table_name`, `chunk_tokens`)
//! - `glean_reader`: per-chunk insight extraction prompt (`table_name`, `chunk_tokens`)
//! - `reporter`: final guide layout (`table_name`, `locale`, report sections)
//!
//! Any template can be replaced by `<template_dir>/<name>.md`.

use chrono::Local;
use minijinja::{Environment, UndefinedBehavior};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::ai::provider::ChatMessage;
use crate::types::{GuideError, Result};

pub const PLAN_TEMPLATE: &str = "plan";
pub const GLEAN_READER_TEMPLATE: &str = "glean_reader";
pub const REPORTER_TEMPLATE: &str = "reporter";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (PLAN_TEMPLATE, include_str!("templates/plan.md")),
    (GLEAN_READER_TEMPLATE, include_str!("templates/glean_reader.md")),
    (REPORTER_TEMPLATE, include_str!("templates/reporter.md")),
];

/// Renders a named template against a variable mapping; undefined variables fail.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, name: &str, vars: &Map<String, Value>) -> Result<String>;
}

/// Built-in templates with optional on-disk overrides
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    override_dir: Option<PathBuf>,
}

impl TemplateSet {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }

    pub fn builtin() -> Self {
        Self::default()
    }

    fn source(&self, name: &str) -> Result<Cow<'static, str>> {
        if let Some(path) = self.override_path(name)
            && path.exists()
        {
            debug!("Loading template override: {}", path.display());
            return Ok(Cow::Owned(std::fs::read_to_string(&path)?));
        }

        BUILTIN_TEMPLATES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, src)| Cow::Borrowed(*src))
            .ok_or_else(|| GuideError::rendering(name, "unknown template"))
    }

    fn override_path(&self, name: &str) -> Option<PathBuf> {
        self.override_dir
            .as_deref()
            .map(|dir: &Path| dir.join(format!("{}.md", name)))
    }
}

impl TemplateRenderer for TemplateSet {
    fn render(&self, name: &str, vars: &Map<String, Value>) -> Result<String> {
        let source = self.source(name)?;

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);

        env.template_from_named_str(name, &source)
            .and_then(|template| template.render(vars))
            .map_err(|e| GuideError::rendering(name, e.to_string()))
    }
}

/// Render `name` as the system prompt and append `extra` messages.
///
/// `current_time` is added to the variables unless the caller set it.
pub fn apply_prompt_template(
    renderer: &dyn TemplateRenderer,
    name: &str,
    mut vars: Map<String, Value>,
    extra: Vec<ChatMessage>,
) -> Result<Vec<ChatMessage>> {
    vars.entry("current_time").or_insert_with(|| {
        Value::String(Local::now().format("%a %b %d %Y %H:%M:%S %z").to_string())
    });

    let system = renderer.render(name, &vars)?;
    let mut messages = Vec::with_capacity(extra.len() + 1);
    messages.push(ChatMessage::system(system));
    messages.extend(extra);
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ChatRole;
    use serde_json::json;
    use tempfile::TempDir;

    fn vars(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builtin_plan_renders() {
        let set = TemplateSet::builtin();
        let out = set
            .render(
                PLAN_TEMPLATE,
                &vars(json!({"table_name": "demo.Table", "chunk_tokens": 2048, "current_time": "now"})),
            )
            .unwrap();
        assert!(out.contains("demo.Table"));
        assert!(out.contains("2048"));
    }

    #[test]
    fn test_builtin_reporter_requires_table_name() {
        let set = TemplateSet::builtin();
        let err = set
            .render(REPORTER_TEMPLATE, &vars(json!({"locale": "en-US"})))
            .unwrap_err();
        assert!(matches!(err, GuideError::Rendering { .. }));
    }

    #[test]
    fn test_reporter_layout() {
        let set = TemplateSet::builtin();
        let out = set
            .render(
                REPORTER_TEMPLATE,
                &vars(json!({
                    "table_name": "demo.Table",
                    "locale": "en-US",
                    "key_columns": ["`ad_id`"],
                    "business_meanings": [],
                    "gotchas": [],
                    "sample_queries": ["SELECT 1"]
                })),
            )
            .unwrap();
        assert!(out.starts_with("# Overview"));
        assert!(out.contains("\n# Key Columns\n"));
        assert!(out.contains("- `ad_id`"));
        assert!(out.contains("```sql\nSELECT 1\n```"));
        assert!(!out.contains("Gotchas"));
        assert!(!out.contains("{%"));
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn test_reporter_without_key_columns() {
        let set = TemplateSet::builtin();
        let out = set
            .render(
                REPORTER_TEMPLATE,
                &vars(json!({
                    "table_name": "demo.Table",
                    "locale": "en-US",
                    "key_columns": [],
                    "business_meanings": [],
                    "gotchas": ["late events"],
                    "sample_queries": []
                })),
            )
            .unwrap();
        assert!(out.contains("# Key Columns\n\n_No key columns"));
        assert!(out.contains("## Gotchas\n\n- late events"));
    }

    #[test]
    fn test_missing_section_variable_fails() {
        let err = TemplateSet::builtin()
            .render(
                REPORTER_TEMPLATE,
                &vars(json!({"table_name": "t", "locale": "en-US", "key_columns": ["a"]})),
            )
            .unwrap_err();
        assert!(matches!(err, GuideError::Rendering { .. }));
        assert!(err.to_string().contains("'reporter'"));
    }

    #[test]
    fn test_syntax_error_is_rendering_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plan.md"), "{% for x in %}").unwrap();
        let set = TemplateSet::new(Some(dir.path().to_path_buf()));

        let err = set
            .render(PLAN_TEMPLATE, &vars(json!({"table_name": "t"})))
            .unwrap_err();
        assert!(matches!(err, GuideError::Rendering { .. }));
    }

    #[test]
    fn test_unknown_template() {
        let err = TemplateSet::builtin().render("nope", &Map::new()).unwrap_err();
        assert!(err.to_string().contains("unknown template"));
    }

    #[test]
    fn test_override_dir_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plan.md"), "custom {{ table_name }}").unwrap();
        let set = TemplateSet::new(Some(dir.path().to_path_buf()));

        let out = set
            .render(PLAN_TEMPLATE, &vars(json!({"table_name": "t"})))
            .unwrap();
        assert_eq!(out, "custom t");

        // templates without an override fall back to the built-in
        assert!(
            set.render(GLEAN_READER_TEMPLATE, &vars(json!({"table_name": "t", "chunk_tokens": 1})))
                .is_ok()
        );
    }

    #[test]
    fn test_apply_prompt_template_prepends_system() {
        let set = TemplateSet::builtin();
        let messages = apply_prompt_template(
            &set,
            GLEAN_READER_TEMPLATE,
            vars(json!({"table_name": "t", "chunk_tokens": 10})),
            vec![ChatMessage::user("chunk text")],
        )
        .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].content, "chunk text");
    }
}
