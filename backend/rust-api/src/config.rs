use serde::Deserialize;
use std::{collections::HashMap, env};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: String,
    pub catalog_path: Option<String>,
    pub recent_activity_limit: usize,
    pub progress_cache_enabled: bool,
    pub progress_cache_capacity: usize,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierConfig {
    pub name: String,
    pub points: u32,
    pub partial_badge: String,
    pub complete_badge: String,
}

/// Raw scoring tables. Validated into `ScoringRules` at start-up; a missing
/// tier table or multiplier is a deployment defect and stops the service.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub tiers: Vec<TierConfig>,
    #[serde(default)]
    pub mastery_points: Option<u32>,
    #[serde(default = "default_mastery_badge")]
    pub mastery_badge: String,
    #[serde(default)]
    pub points_per_correct: HashMap<String, u32>,
    #[serde(default)]
    pub perfect_bonus: HashMap<String, u32>,
    #[serde(default = "default_pass_percentage")]
    pub pass_percentage: f64,
    #[serde(default = "default_time_bonus_threshold")]
    pub time_bonus_threshold_seconds: f64,
    #[serde(default = "default_time_bonus_rate")]
    pub time_bonus_rate: f64,
    #[serde(default = "default_hot_streak_length")]
    pub hot_streak_length: u32,
    #[serde(default = "default_fluency_quiz_count")]
    pub fluency_quiz_count: u32,
}

fn default_mastery_badge() -> String {
    "master_of_language".to_string()
}

fn default_pass_percentage() -> f64 {
    80.0
}

fn default_time_bonus_threshold() -> f64 {
    10.0
}

fn default_time_bonus_rate() -> f64 {
    0.2
}

fn default_hot_streak_length() -> u32 {
    5
}

fn default_fluency_quiz_count() -> u32 {
    10
}

impl ScoringConfig {
    /// The shipped tables (see `config/dev.toml`).
    pub fn canonical() -> Self {
        let tier = |name: &str, points: u32, partial: &str, complete: &str| TierConfig {
            name: name.to_string(),
            points,
            partial_badge: partial.to_string(),
            complete_badge: complete.to_string(),
        };
        let table = |beginner: u32, intermediate: u32, advanced: u32| {
            HashMap::from([
                ("beginner".to_string(), beginner),
                ("intermediate".to_string(), intermediate),
                ("advanced".to_string(), advanced),
            ])
        };

        Self {
            tiers: vec![
                tier("beginner", 0, "basic_vocab", "simple_sentences"),
                tier("intermediate", 300, "grammar_fundamentals", "common_phrases"),
                tier("advanced", 700, "complex_grammar", "idioms"),
            ],
            mastery_points: Some(1500),
            mastery_badge: default_mastery_badge(),
            points_per_correct: table(1, 3, 5),
            perfect_bonus: table(5, 8, 10),
            pass_percentage: default_pass_percentage(),
            time_bonus_threshold_seconds: default_time_bonus_threshold(),
            time_bonus_rate: default_time_bonus_rate(),
            hot_streak_length: default_hot_streak_length(),
            fluency_quiz_count: default_fluency_quiz_count(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional; real deployments set variables directly
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let host = settings
            .get_string("server.host")
            .or_else(|_| env::var("HOST"))
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = settings
            .get_int("server.port")
            .ok()
            .and_then(|port| u16::try_from(port).ok())
            .or_else(|| env::var("PORT").ok().and_then(|port| port.parse().ok()))
            .unwrap_or(8081);

        let default_language = settings
            .get_string("quiz.default_language")
            .unwrap_or_else(|_| "English".to_string());

        let catalog_path = settings
            .get_string("quiz.catalog_path")
            .or_else(|_| env::var("QUIZ_CATALOG_PATH"))
            .ok();

        let recent_activity_limit = settings
            .get_int("progress.recent_activity_limit")
            .ok()
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(5);

        let progress_cache_enabled = settings
            .get_bool("progress.cache_enabled")
            .unwrap_or(true);

        let progress_cache_capacity = settings
            .get_int("progress.cache_capacity")
            .ok()
            .and_then(|capacity| usize::try_from(capacity).ok())
            .unwrap_or(10_000);

        // An absent section deserializes to an empty tier table, which the
        // engine rejects when the rules are built.
        let scoring = match settings.get::<ScoringConfig>("scoring") {
            Ok(scoring) => scoring,
            Err(config::ConfigError::NotFound(_)) => {
                tracing::warn!("No [scoring] section found for environment {}", env);
                ScoringConfig {
                    tiers: Vec::new(),
                    ..ScoringConfig::canonical()
                }
            }
            Err(e) => return Err(e),
        };

        Ok(Config {
            host,
            port,
            default_language,
            catalog_path,
            recent_activity_limit,
            progress_cache_enabled,
            progress_cache_capacity,
            scoring,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
