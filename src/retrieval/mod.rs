//! Document Retrieval
//!
//! The retrieval adapter returns the ordered candidate documents for a table.
//! Ranking belongs to the backend; this layer only truncates to `top_k`.
//!
//! ## Backends
//!
//! - `fixture`: `<fixtures_dir>/<table_name>.json` files (stub mode)
//! - `live`: HTTP search service (live mode)

mod fixture;
mod live;

pub use fixture::{FixtureSearch, FixtureTable, fixtures_index};
pub use live::HttpDocumentSearch;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::types::{Document, Result};

/// Whether documents come from local fixtures or the live service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    Stub,
    Live,
}

impl std::fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalMode::Stub => write!(f, "stub"),
            RetrievalMode::Live => write!(f, "live"),
        }
    }
}

#[async_trait]
pub trait DocumentSearch: Send + Sync {
    /// Ordered documents for `table_name`.
    ///
    /// Fails with `NotFound` when no corpus exists. `top_k` of zero yields an
    /// empty list; `None` or a value above the available count yields all.
    async fn search(&self, table_name: &str, top_k: Option<usize>) -> Result<Vec<Document>>;

    fn mode(&self) -> RetrievalMode;
}

pub type SharedSearch = Arc<dyn DocumentSearch>;

/// Create the retrieval backend selected by configuration
pub fn create_search(config: &RetrievalConfig) -> Result<SharedSearch> {
    if config.use_stub {
        Ok(Arc::new(FixtureSearch::new(config.fixtures_dir.clone())))
    } else {
        Ok(Arc::new(HttpDocumentSearch::new(config)?))
    }
}

pub(crate) fn apply_top_k(mut docs: Vec<Document>, top_k: Option<usize>) -> Vec<Document> {
    if let Some(k) = top_k {
        docs.truncate(k);
    }
    docs
}
