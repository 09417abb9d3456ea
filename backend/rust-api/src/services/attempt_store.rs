use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::Attempt;

/// Append-only attempt history. Listings are always oldest first.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn append_attempt(&self, attempt: Attempt) -> Result<Uuid>;

    async fn list_attempts(&self, user_id: &str) -> Result<Vec<Attempt>>;

    async fn list_attempts_for_language(&self, user_id: &str, language: &str) -> Result<Vec<Attempt>> {
        Ok(self
            .list_attempts(user_id)
            .await?
            .into_iter()
            .filter(|attempt| attempt.language == language)
            .collect())
    }

    async fn get_attempt(&self, user_id: &str, attempt_id: Uuid) -> Result<Option<Attempt>>;
}

#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: RwLock<HashMap<String, Vec<Attempt>>>,
}

impl InMemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn append_attempt(&self, attempt: Attempt) -> Result<Uuid> {
        let id = attempt.id;
        let mut attempts = self.attempts.write().await;
        let history = attempts.entry(attempt.user_id.clone()).or_default();

        // Late arrivals are slotted in by timestamp; equal timestamps keep
        // insertion order.
        let position = history.partition_point(|existing| existing.timestamp <= attempt.timestamp);
        history.insert(position, attempt);

        Ok(id)
    }

    async fn list_attempts(&self, user_id: &str) -> Result<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(user_id).cloned().unwrap_or_default())
    }

    async fn get_attempt(&self, user_id: &str, attempt_id: Uuid) -> Result<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .get(user_id)
            .and_then(|history| history.iter().find(|attempt| attempt.id == attempt_id))
            .cloned())
    }
}
