use std::sync::Arc;

use anyhow::Context;

use crate::config::Config;
use crate::scoring::{AggregateOptions, ScoringRules};

pub mod attempt_store;
pub mod catalog;
pub mod progress_cache;
pub mod quiz_service;

use attempt_store::{AttemptStore, InMemoryAttemptStore};
use catalog::{InMemoryCatalog, QuestionCatalog};
use progress_cache::ProgressCache;
use quiz_service::QuizService;

pub struct AppState {
    pub config: Config,
    pub quiz: QuizService,
}

impl AppState {
    /// Builds the state from configuration. Invalid scoring tables or an
    /// unreadable catalog abort start-up.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let rules = ScoringRules::from_config(&config.scoring)
            .context("Invalid scoring configuration")?;
        tracing::info!(
            "Scoring rules loaded: {} tiers, mastery at {} points",
            rules.tiers.tiers().len(),
            rules.tiers.mastery_points()
        );

        let catalog = match &config.catalog_path {
            Some(path) => InMemoryCatalog::from_file(path)?,
            None => {
                tracing::warn!("No quiz catalog configured, serving an empty catalog");
                InMemoryCatalog::default()
            }
        };

        Ok(Self::with_parts(
            config,
            rules,
            Arc::new(catalog),
            Arc::new(InMemoryAttemptStore::new()),
        ))
    }

    /// Wires the service around caller-provided collaborators.
    pub fn with_parts(
        config: Config,
        rules: ScoringRules,
        catalog: Arc<dyn QuestionCatalog>,
        store: Arc<dyn AttemptStore>,
    ) -> Self {
        let options = AggregateOptions {
            default_language: config.default_language.clone(),
            recent_activity_limit: config.recent_activity_limit,
        };
        let cache = config
            .progress_cache_enabled
            .then(|| ProgressCache::new(config.progress_cache_capacity));
        let quiz = QuizService::new(rules, catalog, store, options, cache);

        Self { config, quiz }
    }
}
