//! Table Guide Pipeline
//!
//! Plan, research and report stages wired into a fixed workflow:
//!
//! ```text
//! __start__ → planner → researcher → reporter → __end__
//! ```
//!
//! `TableGuidePipeline` owns the compiled graph and picks stub or live
//! collaborators once, at construction.

pub mod graph;
pub mod markdown;
pub mod merge;
pub mod planner;
pub mod reporter;
pub mod researcher;

pub use graph::{CompiledGraph, END, GraphState, Node, START, SharedNode, StateGraph};
pub use markdown::{CommonMarkFormatter, MarkdownFormatter};
pub use merge::{classify_freshness, merge_insights, merge_insights_at};
pub use planner::TablePlanner;
pub use reporter::TableReporter;
pub use researcher::TableResearcher;

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::ai::prompt::{TemplateRenderer, TemplateSet};
use crate::ai::provider::{SharedChatModel, create_chat_model};
use crate::config::Config;
use crate::retrieval::{RetrievalMode, SharedSearch, create_search};
use crate::types::{GuideError, Result, TableResearchState};

/// Per-request overrides
#[derive(Debug, Clone, Default)]
pub struct GuideOptions {
    pub max_docs: Option<usize>,
    pub locale: Option<String>,
}

pub struct TableGuidePipeline {
    graph: CompiledGraph<TableResearchState>,
    mode: RetrievalMode,
}

impl TableGuidePipeline {
    /// Build collaborators from configuration and compile the workflow
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let model = create_chat_model(&config.llm)?;
        let search = create_search(&config.retrieval)?;
        let templates: Arc<dyn TemplateRenderer> =
            Arc::new(TemplateSet::new(config.report.template_dir.clone()));
        let formatter: Arc<dyn MarkdownFormatter> = Arc::new(CommonMarkFormatter);

        Self::with_collaborators(config, model, search, templates, formatter)
    }

    pub fn with_collaborators(
        config: &Config,
        model: SharedChatModel,
        search: SharedSearch,
        templates: Arc<dyn TemplateRenderer>,
        formatter: Arc<dyn MarkdownFormatter>,
    ) -> Result<Self> {
        let mode = search.mode();

        let planner = TablePlanner::new(
            model.clone(),
            templates.clone(),
            config.research.chunk_tokens,
        );
        let researcher = TableResearcher::new(search, model, templates.clone(), &config.research);
        let reporter = TableReporter::new(templates, formatter, config.report.locale.clone());

        let graph = build_graph(Arc::new(planner), Arc::new(researcher), Arc::new(reporter))?;
        Ok(Self { graph, mode })
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode
    }

    /// Run the workflow for one table and return the Markdown guide
    #[instrument(skip(self, options), fields(table = %table))]
    pub async fn generate(&self, table: &str, options: GuideOptions) -> Result<String> {
        let table = table.trim();
        if table.is_empty() {
            return Err(GuideError::InvalidArgument(
                "table name must not be empty".to_string(),
            ));
        }

        info!(
            table,
            max_docs = ?options.max_docs,
            mode = %self.mode,
            "Generating table guide"
        );
        let started = Instant::now();

        let state = TableResearchState::new(table)
            .with_locale(options.locale)
            .with_max_docs(options.max_docs);
        let state = self.graph.run(state).await?;

        let guide = state
            .table_guide_md
            .ok_or_else(|| GuideError::Graph("reporter produced no guide".to_string()))?;

        info!(
            "Generated guide for {} in {:.2}s",
            table,
            started.elapsed().as_secs_f64()
        );
        Ok(guide)
    }
}

fn build_graph(
    planner: SharedNode<TableResearchState>,
    researcher: SharedNode<TableResearchState>,
    reporter: SharedNode<TableResearchState>,
) -> Result<CompiledGraph<TableResearchState>> {
    let mut graph = StateGraph::new();
    graph.add_node("planner", planner)?;
    graph.add_node("researcher", researcher)?;
    graph.add_node("reporter", reporter)?;
    graph
        .add_edge(START, "planner")
        .add_edge("planner", "researcher")
        .add_edge("researcher", "reporter")
        .add_edge("reporter", END);
    graph.compile()
}
