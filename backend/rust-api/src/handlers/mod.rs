use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod progress;
pub mod quiz;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status_code, status, catalog) = match state.quiz.languages().await {
        Ok(languages) if !languages.is_empty() => (
            StatusCode::OK,
            "healthy",
            json!({ "status": "healthy", "languages": languages }),
        ),
        Ok(_) => (
            StatusCode::OK,
            "degraded",
            json!({ "status": "empty", "languages": [] }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            json!({ "status": "unhealthy", "error": e.to_string() }),
        ),
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "quizengine-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": { "catalog": catalog }
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}

/// Logs a service failure and turns it into a 500. Scoring configuration
/// defects are called out in the message.
pub(crate) fn internal_error(context: &str, e: anyhow::Error) -> (StatusCode, String) {
    if let Some(engine) = e.downcast_ref::<crate::scoring::EngineError>() {
        tracing::error!("{}: scoring configuration error: {}", context, engine);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Scoring configuration error: {}", engine),
        );
    }
    tracing::error!("{}: {:#}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
