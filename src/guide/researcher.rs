//! Researcher stage: retrieve, chunk, read and aggregate.
//!
//! ## Flow
//!
//! 1. Search documents for the table (`NotFound` ends the run)
//! 2. Split each document's canonical JSON with `smart_split`
//! 3. One model call per chunk, at most `max_parallel` in flight per run
//! 4. Malformed replies count as empty output for that chunk
//! 5. Merge outputs in (document, chunk) order and derive report parts

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};

use super::graph::Node;
use super::merge::merge_insights;
use crate::ai::chunker::smart_split;
use crate::ai::prompt::{GLEAN_READER_TEMPLATE, TemplateRenderer, apply_prompt_template};
use crate::ai::provider::{ChatMessage, SharedChatModel};
use crate::ai::tokenizer::TokenCounter;
use crate::ai::validation::parse_or_default;
use crate::config::ResearchConfig;
use crate::retrieval::SharedSearch;
use crate::types::{
    Chunk, Document, GuideError, ModelInsightOutput, ReportParts, Result, StateUpdate,
    TableResearchState,
};

pub struct TableResearcher {
    search: SharedSearch,
    model: SharedChatModel,
    templates: Arc<dyn TemplateRenderer>,
    counter: TokenCounter,
    chunk_tokens: usize,
    max_docs: Option<usize>,
    max_parallel: usize,
    mode_logged: AtomicBool,
}

impl TableResearcher {
    pub fn new(
        search: SharedSearch,
        model: SharedChatModel,
        templates: Arc<dyn TemplateRenderer>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            search,
            model,
            templates,
            counter: TokenCounter::new(config.token_estimator),
            chunk_tokens: config.chunk_tokens,
            max_docs: config.max_docs,
            max_parallel: config.max_parallel,
            mode_logged: AtomicBool::new(false),
        }
    }

    /// Log the retrieval mode on first use; returns whether this call logged it
    fn announce_mode(&self) -> bool {
        if self.mode_logged.swap(true, Ordering::Relaxed) {
            return false;
        }
        info!("Operating in {} retrieval mode", self.search.mode());
        true
    }

    fn chunk_documents(&self, docs: &[Document]) -> Result<Vec<Chunk>> {
        let counter = self.counter;
        let mut chunks = Vec::new();

        for (document_index, doc) in docs.iter().enumerate() {
            let text = doc.to_canonical_text()?;
            let pieces = smart_split(&text, self.chunk_tokens, |s| counter.count(s))?;
            chunks.extend(pieces.enumerate().map(|(chunk_index, text)| Chunk {
                document_index,
                chunk_index,
                text,
            }));
        }
        Ok(chunks)
    }

    /// Read every chunk under a per-run permit pool; results come back in chunk order
    async fn read_chunks(
        &self,
        system: &[ChatMessage],
        chunks: &[Chunk],
    ) -> Result<Vec<ModelInsightOutput>> {
        let permits = Semaphore::new(self.max_parallel.max(1));

        let mut pending: FuturesUnordered<_> = chunks
            .iter()
            .map(|chunk| {
                let permits = &permits;
                async move {
                    let _permit = permits
                        .acquire()
                        .await
                        .map_err(|e| GuideError::Llm(format!("Permit pool closed: {}", e)))?;

                    let mut messages = system.to_vec();
                    messages.push(ChatMessage::user(chunk.text.clone()));

                    let response = self.model.invoke(&messages).await?;
                    debug!(
                        document = chunk.document_index,
                        chunk = chunk.chunk_index,
                        "Chunk read"
                    );
                    let output: ModelInsightOutput =
                        parse_or_default(&response.content, "glean_reader");
                    Ok::<_, GuideError>((chunk.key(), output))
                }
            })
            .collect();

        let mut outputs = Vec::with_capacity(chunks.len());
        while let Some(result) = pending.next().await {
            outputs.push(result?);
        }

        outputs.sort_by_key(|(key, _)| *key);
        Ok(outputs.into_iter().map(|(_, output)| output).collect())
    }

    fn prompt_vars(&self, table_name: &str) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("table_name".to_string(), json!(table_name));
        vars.insert("chunk_tokens".to_string(), json!(self.chunk_tokens));
        vars
    }
}

#[async_trait]
impl Node<TableResearchState> for TableResearcher {
    #[instrument(skip_all, fields(table = %state.table_name()))]
    async fn run(&self, state: &TableResearchState) -> Result<StateUpdate> {
        self.announce_mode();
        let started = Instant::now();
        let table_name = state.table_name();

        let max_docs = state.max_docs.or(self.max_docs);
        let docs = self.search.search(table_name, max_docs).await?;
        let chunks = self.chunk_documents(&docs)?;

        let system = apply_prompt_template(
            self.templates.as_ref(),
            GLEAN_READER_TEMPLATE,
            self.prompt_vars(table_name),
            Vec::new(),
        )?;

        let outputs = self.read_chunks(&system, &chunks).await?;
        let insights = merge_insights(&outputs, &docs);
        let report_parts = ReportParts::derive(&insights);

        info!(
            docs = docs.len(),
            chunks = chunks.len(),
            insights = insights.insights.len(),
            freshness = %insights.freshness_sla,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Research complete"
        );

        Ok(StateUpdate {
            glean_docs: Some(docs),
            doc_chunks: Some(chunks),
            insights: Some(insights),
            report_parts: Some(report_parts),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::TemplateSet;
    use crate::ai::provider::{ChatModel, ModelResponse, StubChatModel};
    use crate::retrieval::{DocumentSearch, FixtureSearch, RetrievalMode};
    use crate::types::{Column, DocType};
    use regex::Regex;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn repo_fixtures() -> Arc<FixtureSearch> {
        Arc::new(FixtureSearch::new(
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/glean"),
        ))
    }

    fn doc(id: &str) -> Document {
        Document {
            doc_id: id.to_string(),
            title: format!("Doc {}", id),
            doc_type: DocType::Wiki,
            table_name: "mem.Table".to_string(),
            description: "notes".to_string(),
            tags: vec![],
            url: String::new(),
            columns: None,
            lineage: None,
            last_updated: None,
            extra: Map::new(),
        }
    }

    /// In-memory corpus
    struct Memory(Vec<Document>);

    #[async_trait]
    impl DocumentSearch for Memory {
        async fn search(&self, table_name: &str, top_k: Option<usize>) -> Result<Vec<Document>> {
            if self.0.is_empty() {
                return Err(GuideError::not_found(table_name));
            }
            let mut docs = self.0.clone();
            if let Some(k) = top_k {
                docs.truncate(k);
            }
            Ok(docs)
        }

        fn mode(&self) -> RetrievalMode {
            RetrievalMode::Stub
        }
    }

    /// Replies with the same text for every chunk
    struct Fixed(&'static str);

    #[async_trait]
    impl ChatModel for Fixed {
        async fn invoke(&self, _messages: &[ChatMessage]) -> Result<ModelResponse> {
            Ok(ModelResponse::text(self.0))
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    /// Tracks peak in-flight calls
    #[derive(Default)]
    struct Counting {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for Counting {
        async fn invoke(&self, _messages: &[ChatMessage]) -> Result<ModelResponse> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ModelResponse::text(r#"{"insights": [], "usage_examples": []}"#))
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn model(&self) -> &str {
            "counting"
        }
    }

    /// Echoes the document id as a tagged insight; earlier documents finish last
    struct Reversed {
        id: Regex,
    }

    #[async_trait]
    impl ChatModel for Reversed {
        async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
            let chunk = &messages[messages.len() - 1].content;
            let id = self
                .id
                .captures(chunk)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            let n: u64 = id.trim_start_matches('d').parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(50 - n * 10)).await;
            Ok(ModelResponse::text(format!(
                r#"{{"insights": ["<INSIGHT_2> from {id}"], "usage_examples": ["q{id}"]}}"#
            )))
        }

        fn name(&self) -> &str {
            "reversed"
        }

        fn model(&self) -> &str {
            "reversed"
        }
    }

    struct Broken;

    #[async_trait]
    impl ChatModel for Broken {
        async fn invoke(&self, _messages: &[ChatMessage]) -> Result<ModelResponse> {
            Err(GuideError::Llm("rate limited".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn model(&self) -> &str {
            "broken"
        }
    }

    fn research_config(max_parallel: usize) -> ResearchConfig {
        ResearchConfig {
            max_parallel,
            ..Default::default()
        }
    }

    fn researcher(
        search: SharedSearch,
        model: SharedChatModel,
        config: &ResearchConfig,
    ) -> TableResearcher {
        TableResearcher::new(search, model, Arc::new(TemplateSet::builtin()), config)
    }

    #[tokio::test]
    async fn test_dummy_model_populates_parts() {
        let model = Arc::new(Fixed(
            r#"{"insights":["<INSIGHT_1> col:ad_id"],"usage_examples":["select *"]}"#,
        ));
        let r = researcher(repo_fixtures(), model, &research_config(4));

        let update = r
            .run(&TableResearchState::new("tracking.AdClickEvent"))
            .await
            .unwrap();

        let parts = update.report_parts.unwrap();
        assert_eq!(parts.key_columns, Some(vec!["col:ad_id".to_string()]));
        assert_eq!(parts.sample_queries, Some(vec!["select *".to_string()]));
        assert!(parts.gotchas.is_none());
        assert!(!update.glean_docs.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parallelism_is_bounded_per_run() {
        let docs: Vec<_> = (0..4)
            .map(|i| Document {
                description: "word ".repeat(40),
                ..doc(&format!("d{}", i))
            })
            .collect();
        let model = Arc::new(Counting::default());
        // tiny budget forces several chunks per document
        let config = ResearchConfig {
            chunk_tokens: 8,
            max_parallel: 3,
            ..Default::default()
        };
        let r = researcher(Arc::new(Memory(docs)), model.clone(), &config);

        let update = r.run(&TableResearchState::new("mem.Table")).await.unwrap();
        let chunks = update.doc_chunks.unwrap();

        assert!(chunks.len() > 3);
        assert_eq!(model.calls.load(Ordering::SeqCst), chunks.len());
        assert_eq!(model.peak.load(Ordering::SeqCst), 3);
        assert_eq!(model.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wide_schema_splits_under_default_budget() {
        let columns = (0..3000)
            .map(|i| Column {
                name: format!("col_{}", i),
                data_type: Some("bigint".to_string()),
                description: None,
            })
            .collect();
        let wide = Document {
            doc_type: DocType::Schema,
            columns: Some(columns),
            ..doc("wide")
        };
        let config = ResearchConfig::default();
        let r = researcher(Arc::new(Memory(vec![])), Arc::new(Fixed("{}")), &config);

        let chunks = r.chunk_documents(&[wide]).unwrap();

        assert!(chunks.len() >= 5, "got {} chunks", chunks.len());
        for chunk in &chunks {
            assert!(chunk.text.split_whitespace().count() <= config.chunk_tokens);
        }
        assert!(chunks.iter().all(|c| c.document_index == 0));
        assert!(chunks[0].text.contains(r#""name": "col_0""#));
    }

    #[tokio::test]
    async fn test_merge_order_ignores_completion_order() {
        let docs: Vec<_> = (0..4).map(|i| doc(&format!("d{}", i))).collect();
        let model = Arc::new(Reversed {
            id: Regex::new(r#""doc_id": "(d\d)""#).unwrap(),
        });
        let r = researcher(Arc::new(Memory(docs)), model, &research_config(4));

        let update = r.run(&TableResearchState::new("mem.Table")).await.unwrap();
        let parts = update.report_parts.unwrap();
        assert_eq!(
            parts.business_meanings.unwrap(),
            vec!["from d0", "from d1", "from d2", "from d3"]
        );
        assert_eq!(parts.sample_queries.unwrap(), vec!["qd0", "qd1", "qd2", "qd3"]);
    }

    #[tokio::test]
    async fn test_max_docs_from_state_wins() {
        let docs: Vec<_> = (0..4).map(|i| doc(&format!("d{}", i))).collect();
        let config = ResearchConfig {
            max_docs: Some(3),
            ..Default::default()
        };
        let r = researcher(Arc::new(Memory(docs)), Arc::new(Fixed("{}")), &config);

        let update = r
            .run(&TableResearchState::new("mem.Table").with_max_docs(Some(1)))
            .await
            .unwrap();
        assert_eq!(update.glean_docs.unwrap().len(), 1);

        let update = r.run(&TableResearchState::new("mem.Table")).await.unwrap();
        assert_eq!(update.glean_docs.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_output_yields_empty_parts() {
        let r = researcher(
            Arc::new(Memory(vec![doc("d0")])),
            Arc::new(Fixed("Sorry, I can't help with that.")),
            &research_config(2),
        );

        let update = r.run(&TableResearchState::new("mem.Table")).await.unwrap();
        assert!(update.report_parts.unwrap().is_empty());
        assert!(update.insights.unwrap().insights.is_empty());
    }

    #[tokio::test]
    async fn test_model_error_fails_run() {
        let r = researcher(
            Arc::new(Memory(vec![doc("d0")])),
            Arc::new(Broken),
            &research_config(2),
        );
        let err = r.run(&TableResearchState::new("mem.Table")).await.unwrap_err();
        assert!(matches!(err, GuideError::Llm(_)));
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let r = researcher(repo_fixtures(), Arc::new(Fixed("{}")), &research_config(2));
        let err = r
            .run(&TableResearchState::new("nope.Missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_mode_announced_once_per_instance() {
        let make = || researcher(repo_fixtures(), Arc::new(Fixed("{}")), &research_config(2));

        let r = make();
        assert!(r.announce_mode());
        r.run(&TableResearchState::new("tracking.PageView"))
            .await
            .unwrap();
        assert!(!r.announce_mode());

        assert!(make().announce_mode());
    }

    #[tokio::test]
    async fn test_stub_model_over_fixtures() {
        let r = researcher(
            repo_fixtures(),
            Arc::new(StubChatModel::new().unwrap()),
            &research_config(4),
        );
        let update = r
            .run(&TableResearchState::new("tracking.AdClickEvent"))
            .await
            .unwrap();

        let parts = update.report_parts.unwrap();
        let key_columns = parts.key_columns.unwrap();
        assert!(key_columns.iter().any(|c| c.contains("ad_id")));
        assert!(parts.sample_queries.is_some());
    }
}
