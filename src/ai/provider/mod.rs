//! Chat Model Abstraction
//!
//! Defines the `ChatModel` trait: an ordered list of role-tagged messages in,
//! response text out. Implementations never promise valid JSON; callers parse
//! through `ai::validation`.
//!
//! ## Implementations
//!
//! - `openai`: OpenAI-compatible Chat Completions API (live)
//! - `stub`: deterministic offline model for fixture-backed runs and tests

mod openai;
mod stub;

pub use openai::OpenAiChatModel;
pub use stub::StubChatModel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::types::{GuideError, Result};

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Token usage reported by the provider (zero when unknown)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// Raw response text
    pub content: String,
    pub usage: TokenUsage,
}

impl ModelResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
        }
    }
}

// =============================================================================
// ChatModel Trait
// =============================================================================

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and return the model's reply
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ModelResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Shared chat model for concurrent access across pipeline stages.
pub type SharedChatModel = Arc<dyn ChatModel>;

/// Create a shared chat model from configuration
pub fn create_chat_model(config: &LlmConfig) -> Result<SharedChatModel> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiChatModel::new(config)?)),
        "stub" => Ok(Arc::new(StubChatModel::new()?)),
        other => Err(GuideError::Config(format!(
            "Unknown provider: {}. Supported: openai, stub",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::system("be brief");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
    }

    #[test]
    fn test_create_stub_model() {
        let config = LlmConfig {
            provider: "stub".to_string(),
            ..Default::default()
        };
        let model = create_chat_model(&config).unwrap();
        assert_eq!(model.name(), "stub");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = LlmConfig {
            provider: "claude".to_string(),
            ..Default::default()
        };
        let err = create_chat_model(&config).err().unwrap();
        assert!(matches!(err, GuideError::Config(_)));
    }

    #[test]
    fn test_usage_total() {
        let usage = TokenUsage {
            input_tokens: 100,
            output_tokens: 50,
        };
        assert_eq!(usage.total(), 150);
    }
}
