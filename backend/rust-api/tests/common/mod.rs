#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use quizengine_api::{
    config::Config,
    create_router,
    scoring::ScoringRules,
    services::{
        attempt_store::InMemoryAttemptStore, catalog::InMemoryCatalog, AppState,
    },
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_CATALOG: &str = r#"{
    "English": {
        "beginner": [
            {
                "type": "multiple_choice",
                "question": "Which word means 'a place where you live'?",
                "options": ["Tree", "House", "Car", "Book"],
                "answer": "House"
            },
            {
                "type": "matching",
                "question": "Match the opposites",
                "pairs": [["Hot", "Cold"], ["Big", "Small"], ["Fast", "Slow"]]
            },
            {
                "type": "fill_blank",
                "question": "I ___ a student.",
                "answer": "am",
                "hint": "Verb 'to be' for 'I'"
            }
        ],
        "intermediate": [
            {
                "type": "grammar_application",
                "question": "Yesterday I ___ five miles.",
                "answer": "ran"
            }
        ]
    }
}"#;

pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config::load().expect("Failed to load test configuration");
    let rules = ScoringRules::from_config(&config.scoring).expect("dev scoring tables are valid");
    let catalog = InMemoryCatalog::from_json(TEST_CATALOG).expect("test catalog parses");

    let app_state = Arc::new(AppState::with_parts(
        config,
        rules,
        Arc::new(catalog),
        Arc::new(InMemoryAttemptStore::new()),
    ));

    create_router(app_state)
}

pub fn unique_user(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_json(response).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    read_json(response).await
}

async fn read_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, value)
}

/// Free-text answers: `pattern[i]` decides whether answer `i` is right.
pub fn text_answers(pattern: &[bool], seconds: u32) -> Vec<Value> {
    pattern
        .iter()
        .map(|correct| {
            json!({
                "question_type": "fill_blank",
                "prompt": "Yesterday I ___ five miles.",
                "answer": if *correct { "ran" } else { "run" },
                "correct_answer": "ran",
                "elapsed_seconds": seconds
            })
        })
        .collect()
}

pub async fn submit(
    app: &Router,
    user_id: &str,
    difficulty: &str,
    pattern: &[bool],
    seconds: u32,
) -> (StatusCode, Value) {
    post_json(
        app,
        "/api/v1/attempts",
        json!({
            "user_id": user_id,
            "language": "English",
            "difficulty": difficulty,
            "submissions": text_answers(pattern, seconds)
        }),
    )
    .await
}
