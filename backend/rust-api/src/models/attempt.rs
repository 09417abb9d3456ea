use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{progress::LanguageProgress, Difficulty, QuestionType, Submission};

/// Who is taking which quiz, and the learner's tier for that language at
/// the moment of submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptConfig {
    pub user_id: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub current_tier: Difficulty,
}

/// Request to score and record a completed quiz. The learner's current
/// tier is looked up server-side.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "user_id must be between 1 and 100 characters"
    ))]
    pub user_id: String,

    #[validate(length(min = 1, max = 50, message = "language must not be empty"))]
    pub language: String,

    pub difficulty: Difficulty,

    #[validate(length(max = 100, message = "At most 100 answers per attempt"))]
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

/// Stored per-question outcome, kept for the quiz details view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub question_type: QuestionType,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub time_taken: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub timestamp: DateTime<Utc>,
    pub questions: Vec<QuestionResult>,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub passed: bool,
    pub max_streak: u32,
    pub average_time_seconds: f64,
    pub points_earned: u32,
    pub streak_bonus: u32,
    pub time_bonus: f64,
    /// Points were suppressed because the learner's tier was above the
    /// quiz difficulty.
    pub gated: bool,
}

impl Attempt {
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.score == self.total
    }
}

/// Per-attempt call-outs shown on the results page. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    Proficiency,
    HotStreak,
    SpeedDemon,
    PerfectScore,
}

/// Everything the results page needs after a submission.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub attempt: Attempt,
    pub progress: LanguageProgress,
    pub previous_tier: Difficulty,
    pub level_up: Option<Difficulty>,
    pub highlights: Vec<Highlight>,
}
