//! Reporter stage: renders report parts into the final Markdown guide.

use async_trait::async_trait;
use serde_json::{Map, json};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::graph::Node;
use super::markdown::MarkdownFormatter;
use crate::ai::prompt::{REPORTER_TEMPLATE, TemplateRenderer};
use crate::constants::report::{KEY_COLUMNS_HEADING, KEY_COLUMNS_RAW_HEADING, NO_INSIGHTS_FALLBACK};
use crate::types::{REPORT_SECTIONS, ReportParts, Result, StateUpdate, TableResearchState};

pub struct TableReporter {
    templates: Arc<dyn TemplateRenderer>,
    formatter: Arc<dyn MarkdownFormatter>,
    default_locale: String,
}

impl TableReporter {
    pub fn new(
        templates: Arc<dyn TemplateRenderer>,
        formatter: Arc<dyn MarkdownFormatter>,
        default_locale: impl Into<String>,
    ) -> Self {
        Self {
            templates,
            formatter,
            default_locale: default_locale.into(),
        }
    }

    /// Render, demote the raw Key Columns heading, then format best-effort
    pub fn assemble(
        &self,
        table_name: &str,
        locale: Option<&str>,
        parts: Option<&ReportParts>,
    ) -> Result<String> {
        let Some(parts) = parts.filter(|p| !p.is_empty()) else {
            return Ok(NO_INSIGHTS_FALLBACK.to_string());
        };

        let mut vars = Map::new();
        vars.insert("table_name".to_string(), json!(table_name));
        vars.insert(
            "locale".to_string(),
            json!(locale.unwrap_or(&self.default_locale)),
        );
        // absent sections render as empty lists
        for name in REPORT_SECTIONS {
            vars.insert(name.to_string(), json!([]));
        }
        for (name, items) in parts.sections() {
            vars.insert(name.to_string(), json!(items));
        }

        let rendered = self.templates.render(REPORTER_TEMPLATE, &vars)?;
        let demoted = demote_key_columns(&rendered);

        let formatted = match self.formatter.format(&demoted) {
            Ok(formatted) => formatted,
            Err(e) => {
                warn!(error = %e, "Markdown formatting failed; keeping rendered guide");
                demoted
            }
        };

        Ok(with_single_trailing_newline(&formatted))
    }
}

/// Rewrite lines that are exactly the raw Key Columns heading
fn demote_key_columns(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 8);
    for line in markdown.split_inclusive('\n') {
        let (body, ending) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line, ""),
        };
        if body.trim_end() == KEY_COLUMNS_RAW_HEADING {
            out.push_str(KEY_COLUMNS_HEADING);
        } else {
            out.push_str(body);
        }
        out.push_str(ending);
    }
    out
}

fn with_single_trailing_newline(markdown: &str) -> String {
    let mut out = markdown.trim_end().to_string();
    out.push('\n');
    out
}

#[async_trait]
impl Node<TableResearchState> for TableReporter {
    #[instrument(skip_all, fields(table = %state.table_name()))]
    async fn run(&self, state: &TableResearchState) -> Result<StateUpdate> {
        let guide = self.assemble(
            state.table_name(),
            state.locale.as_deref(),
            state.report_parts.as_ref(),
        )?;

        info!(
            "[Reporter] Assembled guide for {} ({} chars)",
            state.table_name(),
            guide.chars().count()
        );

        Ok(StateUpdate {
            table_guide_md: Some(guide),
            ..Default::default()
        })
    }
}
