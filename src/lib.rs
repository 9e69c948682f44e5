//! tableguide - Table Usage Guide Generator
//!
//! Turns the catalog documents attached to a data table into a Markdown usage
//! guide through a plan → research → report workflow.
//!
//! ## Pipeline
//!
//! - **Planner**: asks the model for an ordered research plan
//! - **Researcher**: retrieves documents, chunks them to a token budget, reads
//!   every chunk concurrently and aggregates tagged insights
//! - **Reporter**: renders report parts through a strict template and
//!   normalizes the Markdown
//!
//! ## Quick Start
//!
//! ```ignore
//! use tableguide::{ConfigLoader, GuideOptions, TableGuidePipeline};
//!
//! let config = ConfigLoader::load(None)?;
//! let pipeline = TableGuidePipeline::from_config(&config)?;
//! let guide = pipeline
//!     .generate("tracking.AdClickEvent", GuideOptions::default())
//!     .await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: model collaborator, prompt templates, chunking, response parsing
//! - [`retrieval`]: fixture and live document search
//! - [`guide`]: workflow engine, stages and insight aggregation
//! - [`server`]: HTTP API
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod guide;
pub mod retrieval;
pub mod server;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader};
pub use types::{GuideError, Result};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use guide::{GuideOptions, TableGuidePipeline, merge_insights};
pub use types::{AggregatedInsights, Document, ModelInsightOutput, ReportParts};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{ChatModel, SharedChatModel, TokenCounter, smart_split};
pub use retrieval::{DocumentSearch, SharedSearch};
