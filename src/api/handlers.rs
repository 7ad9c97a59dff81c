//! HTTP handlers

use super::render::{self, PageBody};
use crate::error::RagError;
use crate::metrics::METRICS;
use crate::rag::{QueryResult, RagPipeline};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub title: String,
    pub language_model: String,
    pub embedding_model: String,
}

/// API error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// HTTP status for a failed query
pub fn status_for(error: &RagError) -> StatusCode {
    match error {
        RagError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        RagError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        RagError::Embedding(_)
        | RagError::Completion(_)
        | RagError::Expansion { .. }
        | RagError::Composition { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub facts: usize,
    pub language_model: String,
    pub embedding_model: String,
}

/// Query page
///
/// GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::page(&state.title, "", PageBody::Empty))
}

/// Answer a query submitted from the page
///
/// POST /
pub async fn submit_query(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> (StatusCode, Html<String>) {
    info!("Query form submitted");

    match state.pipeline.answer(&form.query).await {
        Ok(result) => (
            StatusCode::OK,
            Html(render::page(&state.title, &form.query, PageBody::Answer(&result))),
        ),
        Err(e) => (
            status_for(&e),
            Html(render::page(
                &state.title,
                &form.query,
                PageBody::Error(&e.to_string()),
            )),
        ),
    }
}

/// Answer a query as JSON
///
/// POST /api/v1/answer
pub async fn answer_query(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<QueryResult>, (StatusCode, Json<ApiError>)> {
    match state.pipeline.answer(&request.query).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err((status_for(&e), Json(ApiError::new(e.code(), e.to_string())))),
    }
}

/// Plain text of one fact
///
/// GET /references/:file
pub async fn get_reference(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    match state.pipeline.facts().get(&file) {
        Some(fact) => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            fact.text.clone(),
        )
            .into_response(),
        None => {
            warn!("Unknown reference requested: {}", file);
            (StatusCode::NOT_FOUND, "reference not found").into_response()
        }
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        facts: state.pipeline.facts().len(),
        language_model: state.language_model.clone(),
        embedding_model: state.embedding_model.clone(),
    })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&RagError::InvalidQuery("".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&RagError::Timeout("".into())), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(&RagError::composition("m", "r")), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(&RagError::Internal("".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_serialization() {
        let err = ApiError::new("EXPANSION_ERROR", "bad output");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "EXPANSION_ERROR");
        assert_eq!(json["message"], "bad output");
    }
}
