//! AI Integration Layer
//!
//! Model collaborator, prompt templates, token-budgeted chunking and
//! structural validation of model responses.

pub mod chunker;
pub mod prompt;
pub mod provider;
pub mod tokenizer;
pub mod validation;

pub use chunker::{SmartSplit, smart_split};
pub use prompt::{TemplateRenderer, TemplateSet, apply_prompt_template};
pub use provider::{
    ChatMessage, ChatModel, ChatRole, ModelResponse, OpenAiChatModel, SharedChatModel,
    StubChatModel, TokenUsage, create_chat_model,
};
pub use tokenizer::{TokenCounter, TokenEstimator};
pub use validation::{parse_model_json, parse_or_default, strip_code_fences};
