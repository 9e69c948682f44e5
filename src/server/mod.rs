//! HTTP boundary.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/table_guide?table=<name>` | Generate a guide: `{table, guide}` |
//! | `GET`  | `/fixtures_index` | Fixture tables: `{tables: [...]}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Every route is served at the root and again under `/api`.
//!
//! # Errors
//!
//! `{"detail": "<message>"}` with 400 for a missing or blank table, 404 when
//! the table has no documents, 500 otherwise.
//!
//! # CORS
//!
//! All origins, methods and headers are permitted for the browser client.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::guide::{GuideOptions, TableGuidePipeline};
use crate::retrieval::{FixtureTable, fixtures_index};
use crate::types::{GuideError, Result};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<TableGuidePipeline>,
    fixtures_dir: PathBuf,
}

impl AppState {
    pub fn new(pipeline: Arc<TableGuidePipeline>, fixtures_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            fixtures_dir: fixtures_dir.into(),
        }
    }
}

/// Build the pipeline from `config` and serve until the process exits
pub async fn serve(config: &Config, bind: Option<&str>) -> Result<()> {
    let pipeline = Arc::new(TableGuidePipeline::from_config(config)?);
    let state = AppState::new(pipeline, config.retrieval.fixtures_dir.clone());
    let bind_addr = bind.unwrap_or(&config.server.bind);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(
        "Serving table guides on http://{} ({} retrieval)",
        bind_addr,
        state.pipeline.mode()
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/table_guide", get(handle_table_guide))
        .route("/fixtures_index", get(handle_fixtures_index))
        .route("/health", get(handle_health));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<GuideError> for ApiError {
    fn from(e: GuideError) -> Self {
        let status = match &e {
            GuideError::NotFound { .. } => StatusCode::NOT_FOUND,
            GuideError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            _ => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TableGuideQuery {
    pub table: Option<String>,
    pub max_docs: Option<usize>,
    pub locale: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableGuideResponse {
    pub table: String,
    pub guide: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FixturesIndexResponse {
    pub tables: Vec<FixtureTable>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn handle_table_guide(
    State(state): State<AppState>,
    Query(query): Query<TableGuideQuery>,
) -> std::result::Result<Json<TableGuideResponse>, ApiError> {
    let table = query
        .table
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("query parameter 'table' is required"))?;

    let options = GuideOptions {
        max_docs: query.max_docs,
        locale: query.locale,
    };
    let guide = state.pipeline.generate(&table, options).await?;
    Ok(Json(TableGuideResponse { table, guide }))
}

async fn handle_fixtures_index(
    State(state): State<AppState>,
) -> std::result::Result<Json<FixturesIndexResponse>, ApiError> {
    let tables = fixtures_index(&state.fixtures_dir).await?;
    Ok(Json(FixturesIndexResponse { tables }))
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, RetrievalConfig};

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/glean")
    }

    fn state() -> AppState {
        let config = Config {
            llm: LlmConfig {
                provider: "stub".to_string(),
                ..Default::default()
            },
            retrieval: RetrievalConfig {
                use_stub: true,
                fixtures_dir: fixtures_dir(),
                ..Default::default()
            },
            ..Default::default()
        };
        let pipeline = TableGuidePipeline::from_config(&config).unwrap();
        AppState::new(Arc::new(pipeline), fixtures_dir())
    }

    fn query(table: Option<&str>) -> Query<TableGuideQuery> {
        Query(TableGuideQuery {
            table: table.map(String::from),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_table_guide_ok() {
        let Json(body) = handle_table_guide(State(state()), query(Some("tracking.PageView")))
            .await
            .unwrap();
        assert_eq!(body.table, "tracking.PageView");
        assert!(body.guide.starts_with("# "));
    }

    #[tokio::test]
    async fn test_table_guide_status_codes() {
        let missing = handle_table_guide(State(state()), query(None))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::BAD_REQUEST);

        let blank = handle_table_guide(State(state()), query(Some("   ")))
            .await
            .unwrap_err();
        assert_eq!(blank.status, StatusCode::BAD_REQUEST);

        let unknown = handle_table_guide(State(state()), query(Some("nope.Missing")))
            .await
            .unwrap_err();
        assert_eq!(unknown.status, StatusCode::NOT_FOUND);
        assert!(unknown.detail.contains("nope.Missing"));
    }

    #[test]
    fn test_error_mapping() {
        let err: ApiError = GuideError::Llm("boom".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fixtures_index_and_health() {
        let Json(index) = handle_fixtures_index(State(state())).await.unwrap();
        assert_eq!(index.tables.len(), 3);

        let Json(health) = handle_health().await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }
}
