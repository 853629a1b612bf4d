//! API request handlers

use crate::neo4j::GraphStore;
use crate::qa::{AskResponse, QaError, QaPipeline};
use crate::schema::{catalog::CatalogDescription, SchemaCatalog};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Shared server state
pub struct ServerState {
    pub pipeline: Arc<QaPipeline>,
    /// Used directly by the health check
    pub store: Arc<dyn GraphStore>,
    pub catalog: SchemaCatalog,
}

pub type ApiState = Arc<ServerState>;

impl ServerState {
    pub fn new(pipeline: Arc<QaPipeline>, store: Arc<dyn GraphStore>, catalog: SchemaCatalog) -> Self {
        Self {
            pipeline,
            store,
            catalog,
        }
    }

    pub fn from_app_state(state: &AppState) -> Self {
        let catalog = SchemaCatalog::standard();
        let pipeline = QaPipeline::new(
            state.store.clone(),
            state.llm.clone(),
            catalog,
            state.config.qa_settings(),
        );
        Self::new(Arc::new(pipeline), state.store.clone(), catalog)
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    pub neo4j: String,
}

/// Health check handler. 200 when Neo4j answers, 503 otherwise.
pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let neo4j_ok = match state.store.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Neo4j health check failed: {}", e);
            false
        }
    };

    let (http_status, status, neo4j) = if neo4j_ok {
        (StatusCode::OK, "ok", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: state.catalog.version().to_string(),
            neo4j: neo4j.to_string(),
        }),
    )
}

// ============================================================================
// Questions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// Answer a natural-language question about the graph
pub async fn ask(
    State(state): State<ApiState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("ask", %request_id);

    async move {
        tracing::info!(question = %request.query, "Question received");
        let response = state.pipeline.ask(&request.query).await?;
        tracing::info!(
            rows = response.raw_results.len(),
            degraded = response.answer_degraded,
            "Question answered"
        );
        Ok::<_, AppError>(Json(response))
    }
    .instrument(span)
    .await
}

// ============================================================================
// Schema
// ============================================================================

pub async fn schema(State(state): State<ApiState>) -> Json<CatalogDescription> {
    Json(state.catalog.description())
}

// ============================================================================
// Error handling
// ============================================================================

/// API error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    BadRequest(String),
    BadGateway(String),
    GatewayTimeout(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<QaError> for AppError {
    fn from(err: QaError) -> Self {
        let message = err.to_string();
        match err {
            QaError::InvalidQuestion(_) | QaError::SchemaViolation(_) => {
                AppError::BadRequest(message)
            }
            QaError::TranslationFailed(_)
            | QaError::QueryExecutionFailed(_)
            | QaError::ConnectionFailed(_) => AppError::BadGateway(message),
            QaError::Timeout(_) => AppError::GatewayTimeout(message),
        }
    }
}
