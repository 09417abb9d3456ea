mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_new_learner_sees_default_language() {
    let app = common::create_test_app().await;
    let user = common::unique_user("newcomer");

    let (status, report) =
        common::get_json(&app, &format!("/api/v1/users/{}/progress", user)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total_points"], 0);
    assert_eq!(report["total_quizzes"], 0);
    let english = &report["languages"]["English"];
    assert_eq!(english["current_tier"], "beginner");
    assert_eq!(english["next_tier"], "intermediate");
    assert_eq!(english["points_to_next"], 300);
    assert_eq!(english["badges"], json!([]));
}

#[tokio::test]
async fn test_crossing_threshold_levels_up_and_gates_lower_quizzes() {
    let app = common::create_test_app().await;
    let user = common::unique_user("climber");

    // Perfect advanced quizzes at 20s each: 50 base + 30 streak bonus.
    let mut level_ups = Vec::new();
    for _ in 0..4 {
        let (status, summary) = common::submit(&app, &user, "advanced", &[true; 10], 20).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(summary["attempt"]["points_earned"], 80);
        level_ups.push(summary["level_up"].clone());
    }
    assert_eq!(
        level_ups,
        vec![json!(null), json!(null), json!(null), json!("intermediate")]
    );

    let (_, gated) = common::submit(&app, &user, "beginner", &[true; 10], 3).await;
    assert_eq!(gated["attempt"]["gated"], true);
    assert_eq!(gated["attempt"]["passed"], true);
    assert_eq!(gated["attempt"]["points_earned"], 0);
    assert_eq!(gated["previous_tier"], "intermediate");

    let (_, report) = common::get_json(&app, &format!("/api/v1/users/{}/progress", user)).await;
    let english = &report["languages"]["English"];
    assert_eq!(english["total_points"], 320);
    assert_eq!(english["current_tier"], "intermediate");
    assert_eq!(english["points_to_next"], 380);
    assert_eq!(english["tier_display"]["beginner"], 300);
    assert_eq!(english["tier_display"]["intermediate"], 20);
    assert_eq!(english["points_per_tier"]["advanced"]["points_earned"], 320);
    assert_eq!(english["points_per_tier"]["beginner"]["quizzes"], 1);
    assert_eq!(english["current_streak"], 5);

    let badges = english["badges"].as_array().unwrap();
    for badge in ["basic_vocab", "simple_sentences", "hot_streak", "perfect_score"] {
        assert!(badges.contains(&json!(badge)), "missing {}", badge);
    }
    assert!(!badges.contains(&json!("grammar_fundamentals")));
}

#[tokio::test]
async fn test_failed_quiz_resets_current_streak() {
    let app = common::create_test_app().await;
    let user = common::unique_user("streaky");

    common::submit(&app, &user, "beginner", &[true; 5], 20).await;
    common::submit(&app, &user, "beginner", &[true; 5], 20).await;
    common::submit(&app, &user, "beginner", &[false; 5], 20).await;
    common::submit(&app, &user, "beginner", &[true; 5], 20).await;

    let (_, report) = common::get_json(&app, &format!("/api/v1/users/{}/progress", user)).await;
    let english = &report["languages"]["English"];
    assert_eq!(english["current_streak"], 1);
    assert_eq!(english["highest_streak"], 2);
    assert_eq!(english["perfect_quizzes"], 3);
}

#[tokio::test]
async fn test_recent_activity_is_newest_first() {
    let app = common::create_test_app().await;
    let user = common::unique_user("busy");

    for correct in 0..7usize {
        let pattern: Vec<bool> = (0..7).map(|i| i < correct).collect();
        common::submit(&app, &user, "beginner", &pattern, 20).await;
    }

    let (_, report) = common::get_json(&app, &format!("/api/v1/users/{}/progress", user)).await;
    let recent = report["recent_activity"].as_array().unwrap();
    assert_eq!(recent.len(), 5);
    let scores: Vec<u64> = recent.iter().map(|entry| entry["score"].as_u64().unwrap()).collect();
    assert_eq!(scores, vec![6, 5, 4, 3, 2]);
    assert_eq!(report["total_quizzes"], 7);
}

#[tokio::test]
async fn test_attempt_details_round_trip() {
    let app = common::create_test_app().await;
    let user = common::unique_user("details");

    let (_, summary) = common::submit(&app, &user, "intermediate", &[true, false, true], 6).await;
    let attempt_id = summary["attempt"]["id"].as_str().unwrap().to_string();

    let (status, attempt) = common::get_json(
        &app,
        &format!("/api/v1/users/{}/attempts/{}", user, attempt_id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempt["score"], 2);
    assert_eq!(attempt["questions"][1]["user_answer"], "run");
    assert_eq!(attempt["questions"][1]["correct_answer"], "ran");

    let (status, _) = common::get_json(
        &app,
        &format!("/api/v1/users/someone-else/attempts/{}", attempt_id),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::get_json(
        &app,
        &format!("/api/v1/users/{}/attempts/{}", user, Uuid::new_v4()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::get_json(&app, &format!("/api/v1/users/{}/attempts/not-a-uuid", user)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_progress_is_stable_between_reads() {
    let app = common::create_test_app().await;
    let user = common::unique_user("steady");
    common::submit(&app, &user, "intermediate", &[true; 4], 8).await;

    let uri = format!("/api/v1/users/{}/progress", user);
    let (_, first) = common::get_json(&app, &uri).await;
    let (_, second) = common::get_json(&app, &uri).await;
    assert_eq!(first, second);
}
