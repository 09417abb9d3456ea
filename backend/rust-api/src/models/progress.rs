use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::{Attempt, Difficulty};

/// Points actually earned while quizzing at one difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStats {
    pub points_earned: u32,
    pub quizzes: u32,
}

/// Per-user, per-language view recomputed from the attempt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProgress {
    pub language: String,
    pub points_per_tier: BTreeMap<Difficulty, TierStats>,
    pub total_points: u32,
    pub current_tier: Difficulty,
    pub next_tier: Option<Difficulty>,
    pub points_to_next: u32,
    /// Presentation-only distribution of `total_points`, filled bottom-up.
    pub tier_display: BTreeMap<Difficulty, u32>,
    pub level_complete: bool,
    pub current_streak: u32,
    pub highest_streak: u32,
    pub perfect_quizzes: u32,
    pub badges: BTreeSet<String>,
}

impl LanguageProgress {
    pub fn empty(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            points_per_tier: Difficulty::ALL
                .iter()
                .map(|tier| (*tier, TierStats::default()))
                .collect(),
            total_points: 0,
            current_tier: Difficulty::Beginner,
            next_tier: None,
            points_to_next: 0,
            tier_display: BTreeMap::new(),
            level_complete: false,
            current_streak: 0,
            highest_streak: 0,
            perfect_quizzes: 0,
            badges: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub attempt_id: Uuid,
    pub language: String,
    pub difficulty: Difficulty,
    pub score: u32,
    pub total: u32,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
    pub points_earned: u32,
    pub streak_bonus: u32,
    pub time_bonus: f64,
}

impl From<&Attempt> for ActivityEntry {
    fn from(attempt: &Attempt) -> Self {
        Self {
            attempt_id: attempt.id,
            language: attempt.language.clone(),
            difficulty: attempt.difficulty,
            score: attempt.score,
            total: attempt.total,
            passed: attempt.passed,
            timestamp: attempt.timestamp,
            points_earned: attempt.points_earned,
            streak_bonus: attempt.streak_bonus,
            time_bonus: attempt.time_bonus,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub languages: BTreeMap<String, LanguageProgress>,
    pub recent_activity: Vec<ActivityEntry>,
    pub total_points: u32,
    pub total_quizzes: u32,
}

impl ProgressReport {
    pub fn language(&self, language: &str) -> Option<&LanguageProgress> {
        self.languages.get(language)
    }
}
