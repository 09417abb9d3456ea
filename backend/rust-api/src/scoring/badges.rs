//! Stateless badge rules.
//!
//! Every rule names the context fields it reads; the awarder builds one
//! [`BadgeContext`] per language and runs every rule against it. Badges are
//! recomputed on each read, so there is no award ledger to migrate.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::levels::TierTable;
use crate::models::{Difficulty, LanguageProgress};

pub const HOT_STREAK: &str = "hot_streak";
pub const PERFECT_SCORE: &str = "perfect_score";
pub const FLUENCY_BUILDER: &str = "fluency_builder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKey {
    TierDisplayPoints,
    TotalPoints,
    HighestStreak,
    TierQuizzes,
    PerfectQuizzes,
}

/// Fixed input record shared by all rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeContext {
    pub tier_display: BTreeMap<Difficulty, u32>,
    pub total_points: u32,
    pub highest_streak: u32,
    pub tier_quizzes: BTreeMap<Difficulty, u32>,
    pub perfect_quizzes: u32,
}

impl BadgeContext {
    pub fn from_progress(progress: &LanguageProgress) -> Self {
        Self {
            tier_display: progress.tier_display.clone(),
            total_points: progress.total_points,
            highest_streak: progress.highest_streak,
            tier_quizzes: progress
                .points_per_tier
                .iter()
                .map(|(tier, stats)| (*tier, stats.quizzes))
                .collect(),
            perfect_quizzes: progress.perfect_quizzes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeRule {
    /// `percent` of a tier's span reached in the display distribution.
    TierShare {
        id: String,
        tier: Difficulty,
        span: u32,
        percent: u32,
    },
    HotStreak {
        id: String,
        min_streak: u32,
    },
    Mastery {
        id: String,
        points: u32,
    },
    PerfectQuiz {
        id: String,
    },
    TierQuizzes {
        id: String,
        tier: Difficulty,
        count: u32,
    },
}

impl BadgeRule {
    pub fn id(&self) -> &str {
        match self {
            BadgeRule::TierShare { id, .. }
            | BadgeRule::HotStreak { id, .. }
            | BadgeRule::Mastery { id, .. }
            | BadgeRule::PerfectQuiz { id }
            | BadgeRule::TierQuizzes { id, .. } => id,
        }
    }

    pub fn requires(&self) -> &'static [ContextKey] {
        match self {
            BadgeRule::TierShare { .. } => &[ContextKey::TierDisplayPoints],
            BadgeRule::HotStreak { .. } => &[ContextKey::HighestStreak],
            BadgeRule::Mastery { .. } => &[ContextKey::TotalPoints],
            BadgeRule::PerfectQuiz { .. } => &[ContextKey::PerfectQuizzes],
            BadgeRule::TierQuizzes { .. } => &[ContextKey::TierQuizzes],
        }
    }

    pub fn is_met(&self, context: &BadgeContext) -> bool {
        match self {
            BadgeRule::TierShare {
                tier,
                span,
                percent,
                ..
            } => {
                let shown = context.tier_display.get(tier).copied().unwrap_or(0);
                u64::from(shown) * 100 >= u64::from(*span) * u64::from(*percent)
            }
            BadgeRule::HotStreak { min_streak, .. } => context.highest_streak >= *min_streak,
            BadgeRule::Mastery { points, .. } => context.total_points >= *points,
            BadgeRule::PerfectQuiz { .. } => context.perfect_quizzes > 0,
            BadgeRule::TierQuizzes { tier, count, .. } => {
                context.tier_quizzes.get(tier).copied().unwrap_or(0) >= *count
            }
        }
    }

    fn description(&self) -> String {
        match self {
            BadgeRule::TierShare {
                tier,
                span,
                percent,
                ..
            } => format!(
                "Fill {}% of the {} tier ({} of {} points)",
                percent,
                tier,
                u64::from(*span) * u64::from(*percent) / 100,
                span
            ),
            BadgeRule::HotStreak { min_streak, .. } => {
                format!("Pass {} quizzes in a row", min_streak)
            }
            BadgeRule::Mastery { points, .. } => format!("Reach {} total points", points),
            BadgeRule::PerfectQuiz { .. } => "Answer every question of a quiz correctly".to_string(),
            BadgeRule::TierQuizzes { tier, count, .. } => {
                format!("Complete {} {} quizzes", count, tier)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requires: Vec<ContextKey>,
}

fn display_name(id: &str) -> String {
    id.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeBook {
    rules: Vec<BadgeRule>,
}

impl BadgeBook {
    pub fn new(rules: Vec<BadgeRule>) -> Self {
        Self { rules }
    }

    /// Two badges per tier (half and full span), the pass-streak badge, the
    /// mastery badge, a perfect quiz badge and a top-tier quiz count badge.
    pub fn standard(
        table: &TierTable,
        mastery_badge: &str,
        hot_streak_length: u32,
        fluency_quiz_count: u32,
    ) -> Self {
        let mut rules = Vec::new();

        for threshold in table.tiers() {
            let span = table.span_of(threshold.tier).unwrap_or(0);
            rules.push(BadgeRule::TierShare {
                id: threshold.partial_badge.clone(),
                tier: threshold.tier,
                span,
                percent: 50,
            });
            rules.push(BadgeRule::TierShare {
                id: threshold.complete_badge.clone(),
                tier: threshold.tier,
                span,
                percent: 100,
            });
        }

        rules.push(BadgeRule::HotStreak {
            id: HOT_STREAK.to_string(),
            min_streak: hot_streak_length,
        });
        rules.push(BadgeRule::Mastery {
            id: mastery_badge.to_string(),
            points: table.mastery_points(),
        });
        rules.push(BadgeRule::PerfectQuiz {
            id: PERFECT_SCORE.to_string(),
        });
        rules.push(BadgeRule::TierQuizzes {
            id: FLUENCY_BUILDER.to_string(),
            tier: table.top(),
            count: fluency_quiz_count,
        });

        Self { rules }
    }

    pub fn rules(&self) -> &[BadgeRule] {
        &self.rules
    }

    pub fn award(&self, context: &BadgeContext) -> BTreeSet<String> {
        self.rules
            .iter()
            .filter(|rule| rule.is_met(context))
            .map(|rule| rule.id().to_string())
            .collect()
    }

    pub fn catalog(&self) -> Vec<BadgeDefinition> {
        self.rules
            .iter()
            .map(|rule| BadgeDefinition {
                id: rule.id().to_string(),
                name: display_name(rule.id()),
                description: rule.description(),
                requires: rule.requires().to_vec(),
            })
            .collect()
    }
}

pub fn award_badges(progress: &LanguageProgress, book: &BadgeBook) -> BTreeSet<String> {
    book.award(&BadgeContext::from_progress(progress))
}
