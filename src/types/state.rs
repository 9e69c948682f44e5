//! Shared workflow state threaded through the planner, researcher and reporter.

use serde::{Deserialize, Serialize};

use super::{AggregatedInsights, Chunk, Document, ReportParts};
use crate::guide::graph::GraphState;

/// One step of the research plan produced by the planner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(alias = "step", alias = "name")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub need_search: Option<bool>,
}

/// Per-request aggregate; created for one table and discarded after the run.
///
/// Stages never clear fields: `apply` only overwrites what an update carries.
#[derive(Debug, Clone, Default)]
pub struct TableResearchState {
    table_name: String,
    pub locale: Option<String>,
    pub max_docs: Option<usize>,
    pub plan: Option<Vec<PlanStep>>,
    pub glean_docs: Option<Vec<Document>>,
    pub doc_chunks: Option<Vec<Chunk>>,
    pub insights: Option<AggregatedInsights>,
    pub report_parts: Option<ReportParts>,
    pub table_guide_md: Option<String>,
}

impl TableResearchState {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_max_docs(mut self, max_docs: Option<usize>) -> Self {
        self.max_docs = max_docs;
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// Partial update returned by a stage
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub plan: Option<Vec<PlanStep>>,
    pub glean_docs: Option<Vec<Document>>,
    pub doc_chunks: Option<Vec<Chunk>>,
    pub insights: Option<AggregatedInsights>,
    pub report_parts: Option<ReportParts>,
    pub table_guide_md: Option<String>,
}

impl GraphState for TableResearchState {
    type Update = StateUpdate;

    fn apply(&mut self, update: StateUpdate) {
        if let Some(plan) = update.plan {
            self.plan = Some(plan);
        }
        if let Some(docs) = update.glean_docs {
            self.glean_docs = Some(docs);
        }
        if let Some(chunks) = update.doc_chunks {
            self.doc_chunks = Some(chunks);
        }
        if let Some(insights) = update.insights {
            self.insights = Some(insights);
        }
        if let Some(parts) = update.report_parts {
            self.report_parts = Some(parts);
        }
        if let Some(md) = update.table_guide_md {
            self.table_guide_md = Some(md);
        }
    }
}
