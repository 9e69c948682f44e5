//! Live search service retrieval.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{DocumentSearch, RetrievalMode, apply_top_k};
use crate::config::RetrievalConfig;
use crate::constants::retrieval::API_TOKEN_ENV;
use crate::types::{Document, GuideError, Result};

/// Posts `{"query", "page_size"}` to `<api_base>/search`
pub struct HttpDocumentSearch {
    api_base: String,
    /// Never exposed in logs or debug output
    api_token: Option<SecretString>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpDocumentSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDocumentSearch")
            .field("api_base", &self.api_base)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpDocumentSearch {
    pub fn new(config: &RetrievalConfig) -> Result<Self> {
        let api_base = config.api_base.clone().ok_or_else(|| {
            GuideError::Config(
                "retrieval.api_base is required when retrieval.use_stub is false".to_string(),
            )
        })?;

        let api_token = config
            .api_token
            .clone()
            .or_else(|| std::env::var(API_TOKEN_ENV).ok())
            .map(SecretString::from);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuideError::Retrieval(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_token,
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[async_trait]
impl DocumentSearch for HttpDocumentSearch {
    async fn search(&self, table_name: &str, top_k: Option<usize>) -> Result<Vec<Document>> {
        let url = format!("{}/search", self.api_base);
        let mut request = self.client.post(&url).json(&SearchRequest {
            query: table_name,
            // existence is still checked when the caller wants zero results
            page_size: top_k.map(|k| k.max(1)),
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        debug!(table = table_name, ?top_k, "Querying search service");
        let response = request
            .send()
            .await
            .map_err(|e| GuideError::Retrieval(format!("Search request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(GuideError::not_found(table_name)),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(GuideError::Retrieval(format!(
                    "Search service error ({}): {}",
                    status, body
                )));
            }
            _ => {}
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GuideError::Retrieval(format!("Invalid search response: {}", e)))?;

        if body.documents.is_empty() {
            return Err(GuideError::not_found(table_name));
        }
        Ok(apply_top_k(body.documents, top_k))
    }

    fn mode(&self) -> RetrievalMode {
        RetrievalMode::Live
    }
}
