use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::internal_error;
use crate::services::AppState;

/// GET /api/v1/users/{user_id}/progress
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    tracing::info!("Getting progress for user: {}", user_id);

    match state.quiz.get_progress(&user_id).await {
        Ok(report) => Ok((StatusCode::OK, Json(report))),
        Err(e) => Err(internal_error("Failed to compute progress", e)),
    }
}

/// GET /api/v1/users/{user_id}/attempts/{attempt_id} - Quiz details
pub async fn get_attempt(
    State(state): State<Arc<AppState>>,
    Path((user_id, attempt_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let attempt_id = Uuid::parse_str(&attempt_id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid attempt id".to_string()))?;

    tracing::info!("Getting attempt {} for user {}", attempt_id, user_id);

    match state.quiz.get_attempt(&user_id, attempt_id).await {
        Ok(Some(attempt)) => Ok((StatusCode::OK, Json(attempt))),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Attempt not found".to_string())),
        Err(e) => Err(internal_error("Failed to load attempt", e)),
    }
}
