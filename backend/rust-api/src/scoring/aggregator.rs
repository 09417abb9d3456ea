//! Replays a learner's attempt history into per-language progress.
//!
//! Points are order-independent sums. The pass streak is not: attempts must
//! arrive oldest first, and this module does not re-sort them.

use std::collections::BTreeMap;

use super::{badges::award_badges, levels::derive_tier, ScoringRules};
use crate::models::{ActivityEntry, Attempt, LanguageProgress, ProgressReport};

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Language shown to learners without any attempts.
    pub default_language: String,
    pub recent_activity_limit: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            default_language: "English".to_string(),
            recent_activity_limit: 5,
        }
    }
}

fn record_attempt(progress: &mut LanguageProgress, attempt: &Attempt) {
    let stats = progress
        .points_per_tier
        .entry(attempt.difficulty)
        .or_default();
    stats.points_earned += attempt.points_earned;
    stats.quizzes += 1;

    if attempt.passed {
        progress.current_streak += 1;
        progress.highest_streak = progress.highest_streak.max(progress.current_streak);
    } else {
        progress.current_streak = 0;
    }

    if attempt.is_perfect() {
        progress.perfect_quizzes += 1;
    }
}

fn finalize(progress: &mut LanguageProgress, rules: &ScoringRules) {
    progress.total_points = progress
        .points_per_tier
        .values()
        .map(|stats| stats.points_earned)
        .sum();

    let tier = derive_tier(progress.total_points, &rules.tiers);
    progress.current_tier = tier.current_tier;
    progress.next_tier = tier.next_tier;
    progress.points_to_next = tier.points_to_next;
    progress.tier_display = tier.tier_display;
    progress.level_complete = tier.level_complete;
    progress.badges = award_badges(progress, &rules.badges);
}

/// Progress for a single language from that language's attempts, oldest
/// first.
pub fn language_progress<'a, I>(attempts: I, language: &str, rules: &ScoringRules) -> LanguageProgress
where
    I: IntoIterator<Item = &'a Attempt>,
{
    let mut progress = LanguageProgress::empty(language);
    for attempt in attempts {
        if attempt.language == language {
            record_attempt(&mut progress, attempt);
        }
    }
    finalize(&mut progress, rules);
    progress
}

/// Full report over every language a user has practised. `attempts` must
/// be in ascending timestamp order.
pub fn aggregate(attempts: &[Attempt], rules: &ScoringRules, options: &AggregateOptions) -> ProgressReport {
    let mut languages: BTreeMap<String, LanguageProgress> = BTreeMap::new();

    for attempt in attempts {
        let progress = languages
            .entry(attempt.language.clone())
            .or_insert_with(|| LanguageProgress::empty(attempt.language.as_str()));
        record_attempt(progress, attempt);
    }

    if languages.is_empty() {
        languages.insert(
            options.default_language.clone(),
            LanguageProgress::empty(options.default_language.as_str()),
        );
    }

    for progress in languages.values_mut() {
        finalize(progress, rules);
    }

    let total_points = languages.values().map(|progress| progress.total_points).sum();

    ProgressReport {
        languages,
        recent_activity: attempts
            .iter()
            .rev()
            .take(options.recent_activity_limit)
            .map(ActivityEntry::from)
            .collect(),
        total_points,
        total_quizzes: attempts.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, TierStats};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn attempt(language: &str, difficulty: Difficulty, score: u32, points: u32, minute: i64) -> Attempt {
        let total = 10;
        let percentage = f64::from(score) * 10.0;
        Attempt {
            id: Uuid::new_v4(),
            user_id: "learner".to_string(),
            language: language.to_string(),
            difficulty,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minute),
            questions: Vec::new(),
            score,
            total,
            percentage,
            passed: percentage >= 80.0,
            max_streak: 0,
            average_time_seconds: 12.0,
            points_earned: points,
            streak_bonus: 0,
            time_bonus: 0.0,
            gated: false,
        }
    }

    fn rules() -> ScoringRules {
        ScoringRules::canonical()
    }

    #[test]
    fn empty_history_synthesizes_default_language() {
        let report = aggregate(&[], &rules(), &AggregateOptions::default());
        let english = report.language("English").unwrap();
        assert_eq!(report.languages.len(), 1);
        assert_eq!(english.total_points, 0);
        assert_eq!(english.current_tier, Difficulty::Beginner);
        assert_eq!(english.next_tier, Some(Difficulty::Intermediate));
        assert_eq!(english.points_to_next, 300);
        assert!(english.badges.is_empty());
        assert_eq!(report.total_quizzes, 0);
    }

    #[test]
    fn points_accumulate_per_difficulty_and_language() {
        let history = vec![
            attempt("Spanish", Difficulty::Beginner, 9, 120, 0),
            attempt("Spanish", Difficulty::Intermediate, 5, 40, 1),
            attempt("French", Difficulty::Beginner, 10, 90, 2),
            attempt("Spanish", Difficulty::Beginner, 8, 200, 3),
        ];
        let report = aggregate(&history, &rules(), &AggregateOptions::default());

        let spanish = report.language("Spanish").unwrap();
        assert_eq!(
            spanish.points_per_tier[&Difficulty::Beginner],
            TierStats {
                points_earned: 320,
                quizzes: 2
            }
        );
        assert_eq!(spanish.points_per_tier[&Difficulty::Intermediate].points_earned, 40);
        assert_eq!(spanish.total_points, 360);
        assert_eq!(spanish.current_tier, Difficulty::Intermediate);
        assert_eq!(spanish.tier_display[&Difficulty::Beginner], 300);
        assert_eq!(spanish.tier_display[&Difficulty::Intermediate], 60);
        assert!(spanish.badges.contains("simple_sentences"));

        let french = report.language("French").unwrap();
        assert_eq!(french.total_points, 90);
        assert_eq!(french.perfect_quizzes, 1);
        assert!(french.badges.contains("perfect_score"));

        assert_eq!(report.total_points, 450);
        assert_eq!(report.total_quizzes, 4);
        assert!(report.language("English").is_none());
    }

    #[test]
    fn pass_streak_follows_chronology() {
        let history = vec![
            attempt("German", Difficulty::Beginner, 9, 10, 0),
            attempt("German", Difficulty::Beginner, 8, 10, 1),
            attempt("German", Difficulty::Beginner, 3, 10, 2),
            attempt("German", Difficulty::Beginner, 10, 10, 3),
        ];
        let report = aggregate(&history, &rules(), &AggregateOptions::default());
        let german = report.language("German").unwrap();
        assert_eq!(german.current_streak, 1);
        assert_eq!(german.highest_streak, 2);

        let mut reversed = history.clone();
        reversed.reverse();
        let backwards = aggregate(&reversed, &rules(), &AggregateOptions::default());
        let german_backwards = backwards.language("German").unwrap();
        assert_eq!(german_backwards.current_streak, 2);
        assert_ne!(german_backwards.current_streak, german.current_streak);
        assert_eq!(german_backwards.total_points, german.total_points);
    }

    #[test]
    fn streaks_are_tracked_per_language() {
        let history = vec![
            attempt("Spanish", Difficulty::Beginner, 9, 10, 0),
            attempt("French", Difficulty::Beginner, 2, 10, 1),
            attempt("Spanish", Difficulty::Beginner, 9, 10, 2),
        ];
        let report = aggregate(&history, &rules(), &AggregateOptions::default());
        assert_eq!(report.language("Spanish").unwrap().current_streak, 2);
        assert_eq!(report.language("French").unwrap().current_streak, 0);
    }

    #[test]
    fn five_passes_in_a_row_earn_hot_streak() {
        let history: Vec<Attempt> = (0..5)
            .map(|minute| attempt("Spanish", Difficulty::Beginner, 10, 5, minute))
            .collect();
        let report = aggregate(&history, &rules(), &AggregateOptions::default());
        assert!(report.language("Spanish").unwrap().badges.contains("hot_streak"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let history = vec![
            attempt("Spanish", Difficulty::Beginner, 9, 150, 0),
            attempt("Spanish", Difficulty::Advanced, 4, 0, 1),
            attempt("Italian", Difficulty::Intermediate, 8, 75, 2),
        ];
        let options = AggregateOptions::default();
        assert_eq!(
            aggregate(&history, &rules(), &options),
            aggregate(&history, &rules(), &options)
        );
    }

    #[test]
    fn recent_activity_is_newest_first_and_limited() {
        let history: Vec<Attempt> = (0..8)
            .map(|minute| attempt("Spanish", Difficulty::Beginner, 7, minute as u32, minute))
            .collect();
        let report = aggregate(&history, &rules(), &AggregateOptions::default());
        assert_eq!(report.recent_activity.len(), 5);
        assert_eq!(report.recent_activity[0].points_earned, 7);
        assert_eq!(report.recent_activity[4].points_earned, 3);
    }

    #[test]
    fn language_progress_ignores_other_languages() {
        let history = vec![
            attempt("Spanish", Difficulty::Beginner, 9, 310, 0),
            attempt("French", Difficulty::Beginner, 9, 900, 1),
        ];
        let spanish = language_progress(&history, "Spanish", &rules());
        assert_eq!(spanish.total_points, 310);
        assert_eq!(spanish.current_tier, Difficulty::Intermediate);
    }
}
