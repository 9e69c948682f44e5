//! Deterministic offline chat model.
//!
//! Answers without network access so fixture-backed runs produce a real
//! guide. A conversation carrying a user message is treated as a document
//! chunk to read; a system-only conversation is a planning request.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use super::{ChatMessage, ChatModel, ChatRole, ModelResponse};
use crate::types::{GuideError, Result};

const CAVEAT_WORDS: &str = r"(?i)\b(deprecated|pii|null|owner|late)\b";

pub struct StubChatModel {
    column: Regex,
    title: Regex,
    table: Regex,
    caveat: Regex,
}

impl std::fmt::Debug for StubChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubChatModel").finish_non_exhaustive()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| GuideError::Llm(format!("Invalid stub pattern: {}", e)))
}

impl StubChatModel {
    pub fn new() -> Result<Self> {
        Ok(Self {
            column: compile(r#""name"\s*:\s*"([^"]+)""#)?,
            title: compile(r#""title"\s*:\s*"([^"]+)""#)?,
            table: compile(r#""table_name"\s*:\s*"([^"]+)""#)?,
            caveat: compile(CAVEAT_WORDS)?,
        })
    }

    fn read_chunk(&self, chunk: &str) -> serde_json::Value {
        let columns: Vec<&str> = self
            .column
            .captures_iter(chunk)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();

        let mut insights: Vec<String> = columns
            .iter()
            .map(|name| format!("<INSIGHT_1> `{}`", name))
            .collect();

        if let Some(title) = self.title.captures(chunk).and_then(|c| c.get(1)) {
            insights.push(format!("<INSIGHT_2> Documented in \"{}\"", title.as_str()));
        }

        let mut caveats: Vec<String> = self
            .caveat
            .find_iter(chunk)
            .map(|m| m.as_str().to_lowercase())
            .collect();
        caveats.sort();
        caveats.dedup();
        for word in caveats {
            insights.push(format!(
                "<INSIGHT_3> Source mentions '{}'; check before relying on it",
                word
            ));
        }

        let mut usage_examples = Vec::new();
        if let Some(table) = self.table.captures(chunk).and_then(|c| c.get(1)) {
            let table = table.as_str();
            match columns.first() {
                Some(column) => usage_examples.push(format!(
                    "SELECT {column}, COUNT(*) FROM {table} GROUP BY {column}"
                )),
                None => usage_examples.push(format!("SELECT * FROM {table} LIMIT 10")),
            }
        }

        json!({ "insights": insights, "usage_examples": usage_examples })
    }

    fn plan() -> serde_json::Value {
        json!([
            {"title": "Collect catalog documents", "description": "Retrieve schema, wiki and lineage records for the table", "need_search": true},
            {"title": "Extract insights", "description": "Read each document chunk for key columns, meanings and caveats", "need_search": false},
            {"title": "Assemble guide", "description": "Render the collected sections into Markdown", "need_search": false}
        ])
    }
}

#[async_trait]
impl ChatModel for StubChatModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
        let chunk = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str());

        let body = match chunk {
            Some(chunk) => self.read_chunk(chunk),
            None => Self::plan(),
        };

        Ok(ModelResponse::text(format!("```json\n{}\n```", body)))
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub"
    }
}
