use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::models::{Difficulty, Question};

/// Read-only source of quiz questions.
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Questions for one quiz in display order. Unknown language or
    /// difficulty yields an empty list.
    async fn get_questions(&self, language: &str, difficulty: Difficulty) -> Result<Vec<Question>>;

    async fn languages(&self) -> Result<Vec<String>>;
}

/// Catalog held in memory, loaded once from a JSON document shaped
/// `{ language: { difficulty: [question, ...] } }`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    quizzes: HashMap<String, BTreeMap<Difficulty, Vec<Question>>>,
}

impl InMemoryCatalog {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read quiz catalog {}", path))?;
        let catalog = Self::from_json(&raw)
            .with_context(|| format!("Failed to parse quiz catalog {}", path))?;

        tracing::info!(
            "Quiz catalog loaded from {}: {} languages, {} questions",
            path,
            catalog.quizzes.len(),
            catalog.question_count()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, HashMap<String, Vec<Question>>> = serde_json::from_str(raw)?;

        let mut quizzes = HashMap::new();
        for (language, levels) in parsed {
            let mut by_difficulty = BTreeMap::new();
            for (level, questions) in levels {
                let difficulty: Difficulty = level
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!("{} in language {}", e, language))?;
                by_difficulty.insert(difficulty, questions);
            }
            quizzes.insert(language, by_difficulty);
        }

        Ok(Self { quizzes })
    }

    pub fn insert(&mut self, language: &str, difficulty: Difficulty, questions: Vec<Question>) {
        self.quizzes
            .entry(language.to_string())
            .or_default()
            .insert(difficulty, questions);
    }

    fn question_count(&self) -> usize {
        self.quizzes
            .values()
            .flat_map(|levels| levels.values())
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl QuestionCatalog for InMemoryCatalog {
    async fn get_questions(&self, language: &str, difficulty: Difficulty) -> Result<Vec<Question>> {
        Ok(self
            .quizzes
            .get(language)
            .and_then(|levels| levels.get(&difficulty))
            .cloned()
            .unwrap_or_default())
    }

    async fn languages(&self) -> Result<Vec<String>> {
        let mut languages: Vec<String> = self.quizzes.keys().cloned().collect();
        languages.sort();
        Ok(languages)
    }
}
