//! Planner stage: asks the model for an ordered research plan.
//!
//! The plan is informational; later stages run whether or not it is empty.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::graph::Node;
use crate::ai::prompt::{PLAN_TEMPLATE, TemplateRenderer, apply_prompt_template};
use crate::ai::provider::SharedChatModel;
use crate::ai::validation::parse_model_json;
use crate::types::{PlanStep, Result, StateUpdate, TableResearchState};

/// Accepted plan layouts: a bare array or `{"steps": [...]}`
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanDoc {
    Steps(Vec<PlanStep>),
    Wrapped { steps: Vec<PlanStep> },
}

impl PlanDoc {
    fn into_steps(self) -> Vec<PlanStep> {
        match self {
            PlanDoc::Steps(steps) | PlanDoc::Wrapped { steps } => steps,
        }
    }
}

pub struct TablePlanner {
    model: SharedChatModel,
    templates: Arc<dyn TemplateRenderer>,
    chunk_tokens: usize,
}

impl TablePlanner {
    pub fn new(
        model: SharedChatModel,
        templates: Arc<dyn TemplateRenderer>,
        chunk_tokens: usize,
    ) -> Self {
        Self {
            model,
            templates,
            chunk_tokens,
        }
    }

    fn prompt_vars(&self, table_name: &str) -> Map<String, Value> {
        let mut vars = Map::new();
        vars.insert("table_name".to_string(), json!(table_name));
        vars.insert("chunk_tokens".to_string(), json!(self.chunk_tokens));
        vars
    }
}

/// Parse a plan response; anything unusable becomes an empty plan.
pub fn parse_plan(raw: &str) -> Vec<PlanStep> {
    match parse_model_json::<PlanDoc>(raw) {
        Ok(doc) => doc.into_steps(),
        Err(e) => {
            warn!(error = %e, "Planner returned an unusable plan; continuing without one");
            Vec::new()
        }
    }
}

#[async_trait]
impl Node<TableResearchState> for TablePlanner {
    #[instrument(skip_all, fields(table = %state.table_name()))]
    async fn run(&self, state: &TableResearchState) -> Result<StateUpdate> {
        let messages = apply_prompt_template(
            self.templates.as_ref(),
            PLAN_TEMPLATE,
            self.prompt_vars(state.table_name()),
            Vec::new(),
        )?;

        let response = self.model.invoke(&messages).await?;
        let plan = parse_plan(&response.content);
        debug!(steps = plan.len(), "Research plan ready");

        Ok(StateUpdate {
            plan: Some(plan),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::prompt::TemplateSet;
    use crate::ai::provider::{ChatMessage, ChatModel, ChatRole, ModelResponse, StubChatModel};
    use crate::types::GuideError;
    use std::sync::Mutex;

    /// Returns a canned reply and remembers the prompt it saw
    struct Canned {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl Canned {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for Canned {
        async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok(ModelResponse::text(self.reply.clone()))
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    struct Down;

    #[async_trait]
    impl ChatModel for Down {
        async fn invoke(&self, _messages: &[ChatMessage]) -> Result<ModelResponse> {
            Err(GuideError::Llm("connection refused".into()))
        }

        fn name(&self) -> &str {
            "down"
        }

        fn model(&self) -> &str {
            "down"
        }
    }

    fn planner(model: SharedChatModel) -> TablePlanner {
        TablePlanner::new(model, Arc::new(TemplateSet::builtin()), 512)
    }

    #[test]
    fn test_parse_plan_layouts() {
        let bare = parse_plan(r#"[{"title": "Schema"}, {"step": "Lineage", "need_search": true}]"#);
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[1].title, "Lineage");
        assert_eq!(bare[1].need_search, Some(true));

        let wrapped = parse_plan("```json\n{\"steps\": [{\"name\": \"Usage\"}]}\n```");
        assert_eq!(wrapped[0].title, "Usage");
    }

    #[test]
    fn test_parse_plan_failure_is_empty() {
        assert!(parse_plan("I would start by reading the schema.").is_empty());
        assert!(parse_plan(r#"{"plan": "nope"}"#).is_empty());
    }

    #[tokio::test]
    async fn test_run_renders_prompt_and_parses_plan() {
        let model = Canned::new(r#"[{"title": "Read schema", "description": "columns"}]"#);
        let update = planner(model.clone())
            .run(&TableResearchState::new("tracking.PageView"))
            .await
            .unwrap();

        let plan = update.plan.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].description.as_deref(), Some("columns"));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].role, ChatRole::System);
        assert!(seen[0].content.contains("tracking.PageView"));
        assert!(seen[0].content.contains("512"));
    }

    #[tokio::test]
    async fn test_run_with_malformed_reply_is_empty_plan() {
        let update = planner(Canned::new("no json here"))
            .run(&TableResearchState::new("t"))
            .await
            .unwrap();
        assert_eq!(update.plan, Some(Vec::new()));
        assert!(update.report_parts.is_none());
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let err = planner(Arc::new(Down))
            .run(&TableResearchState::new("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, GuideError::Llm(_)));
    }

    #[tokio::test]
    async fn test_stub_model_plan() {
        let update = planner(Arc::new(StubChatModel::new().unwrap()))
            .run(&TableResearchState::new("t"))
            .await
            .unwrap();
        assert_eq!(update.plan.unwrap().len(), 3);
    }
}
