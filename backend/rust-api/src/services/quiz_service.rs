use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rand::seq::{IndexedRandom, SliceRandom};
use uuid::Uuid;

use super::progress_cache::{Lookup, ProgressCache};
use super::{attempt_store::AttemptStore, catalog::QuestionCatalog};
use crate::metrics::{self, track_store_operation, PROGRESS_RECOMPUTE_DURATION_SECONDS};
use crate::models::question::format_pairs;
use crate::models::{
    Attempt, AttemptConfig, Difficulty, MatchingPayload, ProgressReport, Question,
    QuestionPayload, QuestionType, QuizSummary, RenderedQuestion, RenderedQuiz,
    SubmitAttemptRequest, Submission,
};
use crate::scoring::{
    aggregate, highlights, language_progress, score_attempt, AggregateOptions, BadgeDefinition,
    ScoringRules,
};

/// Questions drawn for one quiz.
pub const QUIZ_LENGTH: usize = 10;

pub struct QuizService {
    rules: ScoringRules,
    catalog: Arc<dyn QuestionCatalog>,
    store: Arc<dyn AttemptStore>,
    options: AggregateOptions,
    progress_cache: Option<ProgressCache>,
}

impl QuizService {
    pub fn new(
        rules: ScoringRules,
        catalog: Arc<dyn QuestionCatalog>,
        store: Arc<dyn AttemptStore>,
        options: AggregateOptions,
        progress_cache: Option<ProgressCache>,
    ) -> Self {
        Self {
            rules,
            catalog,
            store,
            options,
            progress_cache,
        }
    }

    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Validates every submission in order and scores the attempt. Nothing
    /// is stored.
    pub fn validate_and_score(&self, config: &AttemptConfig, submissions: &[Submission]) -> Result<Attempt> {
        let card = score_attempt(&self.rules, config.difficulty, config.current_tier, submissions)?;

        for result in &card.questions {
            metrics::record_answer_validated(result.question_type.family().as_str(), result.is_correct);
        }
        metrics::record_attempt_scored(config.difficulty.as_str(), card.passed, card.gated);

        if card.gated {
            tracing::info!(
                "Attempt by {} gated: tier {} above {} quiz",
                config.user_id,
                config.current_tier,
                config.difficulty
            );
        }

        Ok(card.into_attempt(config, Utc::now()))
    }

    /// Learner tier for one language, before any new attempt.
    pub async fn current_tier(&self, user_id: &str, language: &str) -> Result<Difficulty> {
        let history = track_store_operation(
            "list_attempts_for_language",
            self.store.list_attempts_for_language(user_id, language),
        )
        .await?;
        Ok(language_progress(&history, language, &self.rules).current_tier)
    }

    pub async fn get_progress(&self, user_id: &str) -> Result<ProgressReport> {
        let ticket = match &self.progress_cache {
            Some(cache) => match cache.lookup(user_id).await {
                Lookup::Hit(report) => {
                    metrics::record_cache_hit();
                    return Ok(report);
                }
                Lookup::Miss(ticket) => {
                    metrics::record_cache_miss();
                    Some(ticket)
                }
            },
            None => None,
        };

        let history = track_store_operation("list_attempts", self.store.list_attempts(user_id)).await?;

        let timer = PROGRESS_RECOMPUTE_DURATION_SECONDS.start_timer();
        let report = aggregate(&history, &self.rules, &self.options);
        timer.observe_duration();

        // Zero-attempt reports are synthesized on every read and never cached
        if let (Some(cache), Some(ticket)) = (&self.progress_cache, ticket) {
            if !history.is_empty() {
                cache.fill(user_id, report.clone(), ticket).await;
            }
        }

        Ok(report)
    }

    async fn invalidate_progress(&self, user_id: &str) {
        if let Some(cache) = &self.progress_cache {
            cache.invalidate(user_id).await;
        }
    }

    /// Scores a finished quiz against the learner's current tier, records it
    /// and returns the refreshed standing for the quiz language.
    pub async fn submit_attempt(&self, request: SubmitAttemptRequest) -> Result<QuizSummary> {
        let previous_tier = self.current_tier(&request.user_id, &request.language).await?;

        let config = AttemptConfig {
            user_id: request.user_id,
            language: request.language,
            difficulty: request.difficulty,
            current_tier: previous_tier,
        };
        let attempt = self.validate_and_score(&config, &request.submissions)?;

        track_store_operation("append_attempt", self.store.append_attempt(attempt.clone())).await?;
        self.invalidate_progress(&config.user_id).await;

        tracing::info!(
            "Attempt {} recorded: user={}, language={}, difficulty={}, score={}/{}, points={}",
            attempt.id,
            config.user_id,
            config.language,
            config.difficulty,
            attempt.score,
            attempt.total,
            attempt.points_earned
        );

        let report = self.get_progress(&config.user_id).await?;
        let progress = report
            .language(&config.language)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Progress missing for language {}", config.language))?;

        let level_up = (progress.current_tier > previous_tier).then_some(progress.current_tier);
        if let Some(tier) = level_up {
            tracing::info!(
                "User {} advanced to {} in {}",
                config.user_id,
                tier,
                config.language
            );
        }

        Ok(QuizSummary {
            highlights: highlights(&attempt),
            attempt,
            progress,
            previous_tier,
            level_up,
        })
    }

    pub async fn get_attempt(&self, user_id: &str, attempt_id: Uuid) -> Result<Option<Attempt>> {
        track_store_operation("get_attempt", self.store.get_attempt(user_id, attempt_id)).await
    }

    /// Draws up to [`QUIZ_LENGTH`] questions in random order. Returns `None`
    /// when the catalog has nothing for the language and difficulty.
    pub async fn render_quiz(&self, language: &str, difficulty: Difficulty) -> Result<Option<RenderedQuiz>> {
        let questions = self.catalog.get_questions(language, difficulty).await?;
        if questions.is_empty() {
            return Ok(None);
        }

        let mut rng = rand::rng();
        let drawn: Vec<&Question> = questions
            .choose_multiple(&mut rng, QUIZ_LENGTH.min(questions.len()))
            .collect();

        let rendered = drawn
            .into_iter()
            .enumerate()
            .map(|(index, question)| render_question(index + 1, question, &mut rng))
            .collect();

        Ok(Some(RenderedQuiz {
            language: language.to_string(),
            difficulty,
            questions: rendered,
        }))
    }

    pub async fn languages(&self) -> Result<Vec<String>> {
        self.catalog.languages().await
    }

    pub fn badge_catalog(&self) -> Vec<BadgeDefinition> {
        self.rules.badges.catalog()
    }
}

fn render_question<R: rand::Rng + ?Sized>(number: usize, question: &Question, rng: &mut R) -> RenderedQuestion {
    let mut rendered = RenderedQuestion {
        number,
        question_type: question.question_type,
        prompt: question.prompt.clone(),
        points: question.points,
        time_limit_seconds: question.time_limit_seconds,
        correct_answer: String::new(),
        options: Vec::new(),
        hint: None,
        explanation: None,
        audio_file: None,
        words: Vec::new(),
        matching: None,
    };

    match &question.payload {
        QuestionPayload::Choice {
            options,
            answer,
            explanation,
            audio_file,
        } => {
            let mut options = options.clone();
            options.sort();
            rendered.options = options;
            rendered.correct_answer = answer.clone();
            if question.question_type.shows_explanation() {
                rendered.explanation = explanation.clone();
            }
            if question.question_type == QuestionType::AudioRecognition {
                rendered.audio_file = audio_file.clone();
            }
        }
        QuestionPayload::Text { answer, hint } => {
            rendered.correct_answer = answer.clone();
            rendered.hint = hint.clone();
        }
        QuestionPayload::Construction { words, answer } => {
            rendered.words = words.clone();
            rendered.correct_answer = answer.clone();
        }
        QuestionPayload::Matching { pairs, shuffled } => {
            let left_items = pairs.iter().map(|pair| pair.left.clone()).collect();
            let mut right_items: Vec<String> = pairs.iter().map(|pair| pair.right.clone()).collect();
            if *shuffled {
                right_items.shuffle(rng);
            }
            let expected = format_pairs(pairs);
            rendered.correct_answer = expected.clone();
            rendered.matching = Some(MatchingPayload {
                left_items,
                right_items,
                pairs: pairs.clone(),
                expected_answer: Some(expected),
            });
        }
        QuestionPayload::Opaque { answer } => {
            rendered.correct_answer = answer.clone().unwrap_or_default();
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchPair;
    use crate::services::{attempt_store::InMemoryAttemptStore, catalog::InMemoryCatalog};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Store whose next listing returns its snapshot only after a pause,
    /// so a writer can slip in between the read and the cache fill.
    struct SlowListingStore {
        inner: InMemoryAttemptStore,
        delay_next_list: AtomicBool,
    }

    #[async_trait]
    impl AttemptStore for SlowListingStore {
        async fn append_attempt(&self, attempt: Attempt) -> Result<Uuid> {
            self.inner.append_attempt(attempt).await
        }

        async fn list_attempts(&self, user_id: &str) -> Result<Vec<Attempt>> {
            let history = self.inner.list_attempts(user_id).await?;
            if self.delay_next_list.swap(false, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(history)
        }

        async fn get_attempt(&self, user_id: &str, attempt_id: Uuid) -> Result<Option<Attempt>> {
            self.inner.get_attempt(user_id, attempt_id).await
        }
    }

    fn question(value: serde_json::Value) -> Question {
        serde_json::from_value(value).unwrap()
    }

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::default();
        catalog.insert(
            "English",
            Difficulty::Beginner,
            vec![
                question(json!({
                    "type": "multiple_choice",
                    "question": "Which is a fruit?",
                    "options": ["Table", "Apple", "Chair"],
                    "answer": "Apple"
                })),
                question(json!({
                    "type": "matching",
                    "question": "Match the opposites",
                    "pairs": [["Hot", "Cold"], ["Big", "Small"], ["Fast", "Slow"]]
                })),
            ],
        );
        catalog.insert(
            "English",
            Difficulty::Intermediate,
            (0..15)
                .map(|i| {
                    question(json!({
                        "type": "fill_blank",
                        "question": format!("Blank {}", i),
                        "answer": "ran"
                    }))
                })
                .collect(),
        );
        catalog
    }

    fn service(cache_enabled: bool) -> QuizService {
        QuizService::new(
            ScoringRules::canonical(),
            Arc::new(catalog()),
            Arc::new(InMemoryAttemptStore::new()),
            AggregateOptions::default(),
            cache_enabled.then(|| ProgressCache::new(100)),
        )
    }

    fn request(user: &str, difficulty: Difficulty, correct: usize, total: usize) -> SubmitAttemptRequest {
        SubmitAttemptRequest {
            user_id: user.to_string(),
            language: "English".to_string(),
            difficulty,
            submissions: (0..total)
                .map(|i| {
                    let answer = if i < correct { "ran" } else { "run" };
                    Submission::new(QuestionType::FillBlank, answer, "ran", 20)
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn render_sorts_options_and_keeps_matching_pairs() {
        let quiz = service(false)
            .render_quiz("English", Difficulty::Beginner)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quiz.questions.len(), 2);

        let choice = quiz
            .questions
            .iter()
            .find(|q| q.question_type == QuestionType::MultipleChoice)
            .unwrap();
        assert_eq!(choice.options, vec!["Apple", "Chair", "Table"]);
        assert_eq!(choice.correct_answer, "Apple");

        let matching = quiz
            .questions
            .iter()
            .find(|q| q.question_type == QuestionType::Matching)
            .unwrap();
        let payload = matching.matching.as_ref().unwrap();
        assert_eq!(payload.left_items, vec!["Hot", "Big", "Fast"]);
        let mut right = payload.right_items.clone();
        right.sort();
        assert_eq!(right, vec!["Cold", "Slow", "Small"]);
        assert_eq!(payload.pairs[0], MatchPair::new("Hot", "Cold"));
        assert_eq!(matching.correct_answer, "Hot → Cold, Big → Small, Fast → Slow");
    }

    #[tokio::test]
    async fn render_draws_at_most_quiz_length_numbered_from_one() {
        let quiz = service(false)
            .render_quiz("English", Difficulty::Intermediate)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quiz.questions.len(), QUIZ_LENGTH);
        let numbers: Vec<usize> = quiz.questions.iter().map(|q| q.number).collect();
        assert_eq!(numbers, (1..=QUIZ_LENGTH).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_quiz_renders_none() {
        assert!(service(false)
            .render_quiz("English", Difficulty::Advanced)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rendered_matching_question_validates_after_shuffle() {
        let svc = service(false);
        let quiz = svc
            .render_quiz("English", Difficulty::Beginner)
            .await
            .unwrap()
            .unwrap();
        let matching = quiz
            .questions
            .iter()
            .find(|q| q.question_type == QuestionType::Matching)
            .unwrap();
        let payload = matching.matching.as_ref().unwrap();

        let answer = payload
            .pairs
            .iter()
            .enumerate()
            .map(|(left, pair)| {
                let right = payload
                    .right_items
                    .iter()
                    .position(|item| *item == pair.right)
                    .unwrap();
                format!("{}:{}", left, right)
            })
            .collect::<Vec<_>>()
            .join(",");

        let config = AttemptConfig {
            user_id: "u".to_string(),
            language: "English".to_string(),
            difficulty: Difficulty::Beginner,
            current_tier: Difficulty::Beginner,
        };
        let attempt = svc
            .validate_and_score(&config, &[Submission::capture(matching, answer, 12)])
            .unwrap();
        assert_eq!(attempt.score, 1);
        assert!(attempt.questions[0].is_correct);
    }

    #[tokio::test]
    async fn submission_is_recorded_and_reflected_in_progress() {
        let svc = service(true);
        let summary = svc
            .submit_attempt(request("ana", Difficulty::Intermediate, 9, 10))
            .await
            .unwrap();

        assert_eq!(summary.previous_tier, Difficulty::Beginner);
        assert!(summary.attempt.passed);
        assert_eq!(summary.progress.total_points, summary.attempt.points_earned);

        let report = svc.get_progress("ana").await.unwrap();
        assert_eq!(report.total_quizzes, 1);

        let stored = svc.get_attempt("ana", summary.attempt.id).await.unwrap();
        assert_eq!(stored, Some(summary.attempt));
    }

    #[tokio::test]
    async fn cache_is_invalidated_on_append() {
        let svc = service(true);
        assert_eq!(svc.get_progress("ben").await.unwrap().total_quizzes, 0);

        svc.submit_attempt(request("ben", Difficulty::Beginner, 10, 10))
            .await
            .unwrap();
        assert_eq!(svc.get_progress("ben").await.unwrap().total_quizzes, 1);
    }

    #[tokio::test]
    async fn slow_read_does_not_cache_a_report_older_than_an_append() {
        let store = Arc::new(SlowListingStore {
            inner: InMemoryAttemptStore::new(),
            delay_next_list: AtomicBool::new(false),
        });
        let svc = Arc::new(QuizService::new(
            ScoringRules::canonical(),
            Arc::new(catalog()),
            store.clone(),
            AggregateOptions::default(),
            Some(ProgressCache::new(100)),
        ));

        let config = AttemptConfig {
            user_id: "dee".to_string(),
            language: "English".to_string(),
            difficulty: Difficulty::Beginner,
            current_tier: Difficulty::Beginner,
        };
        let first = svc
            .validate_and_score(&config, &request("dee", Difficulty::Beginner, 10, 10).submissions)
            .unwrap();
        store.append_attempt(first).await.unwrap();

        store.delay_next_list.store(true, Ordering::SeqCst);
        let reader = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.get_progress("dee").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let summary = svc
            .submit_attempt(request("dee", Difficulty::Beginner, 10, 10))
            .await
            .unwrap();
        assert_eq!(summary.progress.total_points, 2 * summary.attempt.points_earned);

        let early = reader.await.unwrap().unwrap();
        assert_eq!(early.total_quizzes, 1);

        assert_eq!(svc.get_progress("dee").await.unwrap().total_quizzes, 2);
    }

    #[tokio::test]
    async fn learners_without_attempts_are_not_cached() {
        let svc = service(true);
        for user in ["nobody-1", "nobody-2", "nobody-3"] {
            assert_eq!(svc.get_progress(user).await.unwrap().total_quizzes, 0);
        }

        let cache = svc.progress_cache.as_ref().unwrap();
        assert_eq!(cache.len().await, 0);

        svc.submit_attempt(request("eve", Difficulty::Beginner, 10, 10))
            .await
            .unwrap();
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn crossing_a_threshold_reports_level_up_and_gates_lower_quizzes() {
        let svc = service(false);
        let mut level_up = None;

        // 10/10 advanced quizzes at 20s: 50 base + 3 * 10 streak bonus.
        for _ in 0..4 {
            let summary = svc
                .submit_attempt(request("cy", Difficulty::Advanced, 10, 10))
                .await
                .unwrap();
            assert_eq!(summary.attempt.points_earned, 80);
            if summary.level_up.is_some() {
                level_up = summary.level_up;
            }
        }
        assert_eq!(level_up, Some(Difficulty::Intermediate));
        assert_eq!(
            svc.current_tier("cy", "English").await.unwrap(),
            Difficulty::Intermediate
        );

        let gated = svc
            .submit_attempt(request("cy", Difficulty::Beginner, 10, 10))
            .await
            .unwrap();
        assert!(gated.attempt.gated);
        assert_eq!(gated.attempt.points_earned, 0);
        assert_eq!(gated.progress.total_points, 320);
    }

    #[test]
    fn badge_catalog_lists_every_rule() {
        let svc = service(false);
        assert_eq!(svc.badge_catalog().len(), svc.rules().badges.rules().len());
    }
}
