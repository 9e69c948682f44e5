//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/tableguide/) and project (./tableguide.toml) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::tokenizer::TokenEstimator;
use crate::constants::report::DEFAULT_LOCALE;
use crate::constants::research::{DEFAULT_CHUNK_TOKENS, DEFAULT_MAX_PARALLEL};
use crate::constants::retrieval::DEFAULT_FIXTURES_DIR;
use crate::types::{GuideError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Model collaborator settings
    pub llm: LlmConfig,

    /// Document retrieval settings
    pub retrieval: RetrievalConfig,

    /// Chunking and concurrency settings for the research stage
    pub research: ResearchConfig,

    /// Report rendering settings
    pub report: ReportConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            research: ResearchConfig::default(),
            report: ReportConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values before any work starts.
    pub fn validate(&self) -> Result<()> {
        if self.research.chunk_tokens == 0 {
            return Err(GuideError::InvalidArgument(
                "research.chunk_tokens must be a positive integer".to_string(),
            ));
        }

        if self.research.max_parallel == 0 {
            return Err(GuideError::InvalidArgument(
                "research.max_parallel must be a positive integer".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(GuideError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(GuideError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.timeout_secs == 0 {
            return Err(GuideError::Config(
                "Retrieval timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

/// API keys are never serialized and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "openai" or "stub"
    pub provider: String,

    /// Model name
    pub model: String,

    /// API key (falls back to OPENAI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Temperature for generation (0.0 = deterministic)
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_base: None,
            temperature: 0.0,
            timeout_secs: 300,
            max_tokens: 4096,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

// =============================================================================
// Retrieval Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Serve documents from the fixture directory instead of the live service
    pub use_stub: bool,

    /// Directory holding `<table_name>.json` fixture files
    pub fixtures_dir: PathBuf,

    /// Live search service base URL
    pub api_base: Option<String>,

    /// Bearer token for the live service (falls back to GLEAN_API_TOKEN)
    #[serde(skip_serializing)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            use_stub: true,
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            api_base: None,
            api_token: None,
            timeout_secs: 30,
        }
    }
}

impl RetrievalConfig {
    pub fn mode(&self) -> &'static str {
        if self.use_stub { "stub" } else { "live" }
    }
}

impl std::fmt::Debug for RetrievalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalConfig")
            .field("use_stub", &self.use_stub)
            .field("fixtures_dir", &self.fixtures_dir)
            .field("api_base", &self.api_base)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// =============================================================================
// Research / Report / Server
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Token budget per chunk
    pub chunk_tokens: usize,

    /// Cap on retrieved documents (None = all)
    pub max_docs: Option<usize>,

    /// Maximum concurrent model calls per research run
    pub max_parallel: usize,

    /// Measuring function used by the chunker
    pub token_estimator: TokenEstimator,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: DEFAULT_CHUNK_TOKENS,
            max_docs: None,
            max_parallel: DEFAULT_MAX_PARALLEL,
            token_estimator: TokenEstimator::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Locale passed to the report template
    pub locale: String,

    /// Directory with `<name>.md` files overriding the built-in templates
    pub template_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            template_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}
