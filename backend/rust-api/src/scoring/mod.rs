//! Quiz scoring and progress rules.
//!
//! Everything in here is pure and synchronous: answers are validated,
//! attempts are scored, and progress is replayed from the attempt history
//! on every read. Nothing is cached or mutated in place.

use std::collections::HashMap;
use thiserror::Error;

use crate::config::ScoringConfig;
use crate::models::Difficulty;

pub mod aggregator;
pub mod badges;
pub mod levels;
pub mod scorer;
pub mod validator;

pub use aggregator::{aggregate, language_progress, AggregateOptions};
pub use badges::{award_badges, BadgeBook, BadgeContext, BadgeDefinition, BadgeRule, ContextKey};
pub use levels::{derive_tier, TierProgress, TierTable, TierThreshold};
pub use scorer::{highlights, score_attempt, Scorecard};
pub use validator::{validate, validate_answer, UNDETERMINED_MATCHES};

/// Configuration defects. These abort the computation that hits them; bad
/// learner input never produces one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("tier threshold table is missing")]
    MissingTierTable,
    #[error("invalid tier threshold table: {0}")]
    InvalidTierTable(String),
    #[error("unknown tier '{0}' in scoring configuration")]
    UnknownTier(String),
    #[error("no {table} entry for difficulty '{difficulty}'")]
    UnknownDifficulty {
        table: &'static str,
        difficulty: String,
    },
}

/// Per-difficulty point multipliers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsTable {
    per_correct: HashMap<Difficulty, u32>,
    perfect_bonus: HashMap<Difficulty, u32>,
}

impl PointsTable {
    pub fn new(per_correct: HashMap<Difficulty, u32>, perfect_bonus: HashMap<Difficulty, u32>) -> Self {
        Self {
            per_correct,
            perfect_bonus,
        }
    }

    pub fn points_per_correct(&self, difficulty: Difficulty) -> Result<u32, EngineError> {
        self.per_correct
            .get(&difficulty)
            .copied()
            .ok_or_else(|| EngineError::UnknownDifficulty {
                table: "points_per_correct",
                difficulty: difficulty.to_string(),
            })
    }

    pub fn perfect_bonus(&self, difficulty: Difficulty) -> Result<u32, EngineError> {
        self.perfect_bonus
            .get(&difficulty)
            .copied()
            .ok_or_else(|| EngineError::UnknownDifficulty {
                table: "perfect_bonus",
                difficulty: difficulty.to_string(),
            })
    }

    fn ensure_complete(&self) -> Result<(), EngineError> {
        for difficulty in Difficulty::ALL {
            self.points_per_correct(difficulty)?;
            self.perfect_bonus(difficulty)?;
        }
        Ok(())
    }
}

/// Linear bonus for fast answers: `rate` of base points at an average of
/// zero seconds, decaying to nothing at `threshold_seconds`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBonusRule {
    pub threshold_seconds: f64,
    pub rate: f64,
}

impl Default for TimeBonusRule {
    fn default() -> Self {
        Self {
            threshold_seconds: 10.0,
            rate: 0.2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringRules {
    pub tiers: TierTable,
    pub points: PointsTable,
    pub pass_percentage: f64,
    pub time_bonus: TimeBonusRule,
    pub badges: BadgeBook,
}

impl ScoringRules {
    pub fn from_config(config: &ScoringConfig) -> Result<Self, EngineError> {
        if config.tiers.is_empty() {
            return Err(EngineError::MissingTierTable);
        }

        let mut thresholds = Vec::with_capacity(config.tiers.len());
        for tier in &config.tiers {
            let difficulty: Difficulty = tier
                .name
                .parse()
                .map_err(|_| EngineError::UnknownTier(tier.name.clone()))?;
            thresholds.push(TierThreshold {
                tier: difficulty,
                points: tier.points,
                partial_badge: tier.partial_badge.clone(),
                complete_badge: tier.complete_badge.clone(),
            });
        }

        let mastery_points = config.mastery_points.ok_or_else(|| {
            EngineError::InvalidTierTable("mastery_points is not set".to_string())
        })?;
        let tiers = TierTable::new(thresholds, mastery_points)?;

        let points = PointsTable::new(
            parse_difficulty_map(&config.points_per_correct)?,
            parse_difficulty_map(&config.perfect_bonus)?,
        );
        points.ensure_complete()?;

        let badges = BadgeBook::standard(
            &tiers,
            &config.mastery_badge,
            config.hot_streak_length,
            config.fluency_quiz_count,
        );

        Ok(Self {
            tiers,
            points,
            pass_percentage: config.pass_percentage,
            time_bonus: TimeBonusRule {
                threshold_seconds: config.time_bonus_threshold_seconds,
                rate: config.time_bonus_rate,
            },
            badges,
        })
    }

    /// The shipped table: beginner 0, intermediate 300, advanced 700,
    /// mastery at 1500 points.
    pub fn canonical() -> Self {
        Self::from_config(&ScoringConfig::canonical())
            .unwrap_or_else(|e| unreachable!("canonical scoring table is valid: {}", e))
    }
}

fn parse_difficulty_map(raw: &HashMap<String, u32>) -> Result<HashMap<Difficulty, u32>, EngineError> {
    raw.iter()
        .map(|(key, value)| {
            key.parse::<Difficulty>()
                .map(|difficulty| (difficulty, *value))
                .map_err(|_| EngineError::UnknownTier(key.clone()))
        })
        .collect()
}
