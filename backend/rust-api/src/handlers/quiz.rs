use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::internal_error;
use crate::{
    models::{Difficulty, SubmitAttemptRequest},
    services::AppState,
};

/// GET /api/v1/quizzes/{language}/{difficulty} - Draw a quiz
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path((language, difficulty)): Path<(String, String)>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let difficulty: Difficulty = difficulty
        .parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))?;

    tracing::info!("Rendering {} quiz for {}", difficulty, language);

    match state.quiz.render_quiz(&language, difficulty).await {
        Ok(Some(quiz)) => Ok((StatusCode::OK, Json(quiz))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("No {} questions available for {}", difficulty, language),
        )),
        Err(e) => Err(internal_error("Failed to render quiz", e)),
    }
}

/// POST /api/v1/attempts - Score and record a finished quiz
pub async fn submit_attempt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    tracing::info!(
        "Submitting attempt: user_id={}, language={}, difficulty={}, answers={}",
        req.user_id,
        req.language,
        req.difficulty,
        req.submissions.len()
    );

    match state.quiz.submit_attempt(req).await {
        Ok(summary) => Ok((StatusCode::CREATED, Json(summary))),
        Err(e) => Err(internal_error("Failed to submit attempt", e)),
    }
}

/// GET /api/v1/badges - Badge catalog with the progress each badge reads
pub async fn list_badges(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.quiz.badge_catalog())
}
