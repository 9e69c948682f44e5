//! Unified Error Type System
//!
//! Centralized error type for the whole table-guide pipeline.
//!
//! ## Error Classes
//!
//! - **InvalidArgument**: bad configuration, raised before any work starts
//! - **NotFound**: no corpus for the requested table (HTTP 404 at the boundary)
//! - **ModelOutputMalformed**: unparseable model output, always recovered by the caller
//! - **Rendering**: template rendering failed (undefined variable, bad syntax)
//! - **Format**: cosmetic Markdown formatter failure, swallowed by the reporter
//!
//! Everything else (transport, I/O, graph wiring) surfaces as a generic failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuideError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No documents found for table: {table}")]
    NotFound { table: String },

    /// Model returned text that is not the expected JSON shape
    #[error("Malformed model output: {0}")]
    ModelOutputMalformed(String),

    #[error("Template '{template}' failed to render: {message}")]
    Rendering { template: String, message: String },

    #[error("Markdown formatting failed: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Workflow graph error: {0}")]
    Graph(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GuideError>;

impl GuideError {
    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    pub fn rendering(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rendering {
            template: template.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
