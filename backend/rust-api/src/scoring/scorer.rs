use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{validator::validate, EngineError, ScoringRules, TimeBonusRule};
use crate::models::{Attempt, AttemptConfig, Difficulty, Highlight, QuestionResult, Submission};

/// In-quiz correct answers needed per streak bonus step.
const STREAK_STEP: u32 = 3;

/// Derived fields of one scored quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub questions: Vec<QuestionResult>,
    pub score: u32,
    pub total: u32,
    pub percentage: f64,
    pub passed: bool,
    pub max_streak: u32,
    pub total_time_seconds: u64,
    pub average_time_seconds: f64,
    pub base_points: u32,
    pub streak_bonus: u32,
    pub time_bonus: f64,
    pub points_earned: u32,
    pub gated: bool,
}

impl Scorecard {
    pub fn into_attempt(self, config: &AttemptConfig, timestamp: DateTime<Utc>) -> Attempt {
        Attempt {
            id: Uuid::new_v4(),
            user_id: config.user_id.clone(),
            language: config.language.clone(),
            difficulty: config.difficulty,
            timestamp,
            questions: self.questions,
            score: self.score,
            total: self.total,
            percentage: self.percentage,
            passed: self.passed,
            max_streak: self.max_streak,
            average_time_seconds: self.average_time_seconds,
            points_earned: self.points_earned,
            streak_bonus: self.streak_bonus,
            time_bonus: self.time_bonus,
            gated: self.gated,
        }
    }
}

pub fn percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(score) * 100.0 / f64::from(total)
    }
}

/// One bonus step for every complete run of three correct answers.
pub fn streak_bonus(max_streak: u32, perfect_bonus: u32) -> u32 {
    (max_streak / STREAK_STEP) * perfect_bonus
}

pub fn time_bonus(base_points: u32, average_time_seconds: f64, rule: &TimeBonusRule) -> f64 {
    if average_time_seconds >= rule.threshold_seconds || rule.threshold_seconds <= 0.0 {
        return 0.0;
    }
    let remaining = 1.0 - average_time_seconds.max(0.0) / rule.threshold_seconds;
    (f64::from(base_points) * rule.rate * remaining).max(0.0)
}

/// Scores one attempt. `current_tier` is the learner's tier for the quiz
/// language before this attempt; quizzes below it earn no points.
pub fn score_attempt(
    rules: &ScoringRules,
    difficulty: Difficulty,
    current_tier: Difficulty,
    submissions: &[Submission],
) -> Result<Scorecard, EngineError> {
    let points_per_correct = rules.points.points_per_correct(difficulty)?;
    let perfect_bonus = rules.points.perfect_bonus(difficulty)?;

    let mut score = 0u32;
    let mut total_time = 0u64;
    let mut streak = 0u32;
    let mut max_streak = 0u32;
    let mut questions = Vec::with_capacity(submissions.len());

    for submission in submissions {
        let result = validate(submission);
        total_time += u64::from(submission.elapsed_seconds);

        if result.is_correct {
            score += 1;
            streak += 1;
            max_streak = max_streak.max(streak);
        } else {
            streak = 0;
        }

        questions.push(QuestionResult {
            question: submission.prompt.clone(),
            question_type: submission.question_type,
            user_answer: result.normalized_user_answer,
            correct_answer: result.normalized_correct_answer,
            is_correct: result.is_correct,
            time_taken: submission.elapsed_seconds,
        });
    }

    let total = questions.len() as u32;
    let percentage = percentage(score, total);
    let passed = percentage >= rules.pass_percentage;

    let average_time_seconds = if total == 0 {
        0.0
    } else {
        total_time as f64 / f64::from(total)
    };

    let base_points = score * points_per_correct;
    let mut streak_bonus = streak_bonus(max_streak, perfect_bonus);
    let mut time_bonus = time_bonus(base_points, average_time_seconds, &rules.time_bonus);
    let mut points_earned =
        (f64::from(base_points) + f64::from(streak_bonus) + time_bonus).floor() as u32;

    let gated = current_tier > difficulty;
    if gated {
        points_earned = 0;
        streak_bonus = 0;
        time_bonus = 0.0;
    }

    Ok(Scorecard {
        questions,
        score,
        total,
        percentage,
        passed,
        max_streak,
        total_time_seconds: total_time,
        average_time_seconds,
        base_points,
        streak_bonus,
        time_bonus,
        points_earned,
        gated,
    })
}

pub fn highlights(attempt: &Attempt) -> Vec<Highlight> {
    let mut found = Vec::new();
    if attempt.percentage >= 70.0 {
        found.push(Highlight::Proficiency);
    }
    if attempt.max_streak >= 5 {
        found.push(Highlight::HotStreak);
    }
    if attempt.total > 0 && attempt.average_time_seconds < 10.0 && attempt.percentage > 60.0 {
        found.push(Highlight::SpeedDemon);
    }
    if attempt.is_perfect() {
        found.push(Highlight::PerfectScore);
    }
    found
}
