use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::metrics::PROGRESS_CACHE_ENTRIES;
use crate::models::ProgressReport;

/// Outcome of a cache lookup. A miss carries the generation observed before
/// the caller reads the attempt history; the fill is dropped if any
/// invalidation happened since.
pub enum Lookup {
    Hit(ProgressReport),
    Miss(FillTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTicket(u64);

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedReport>,
    generation: u64,
    next_sequence: u64,
}

struct CachedReport {
    report: ProgressReport,
    sequence: u64,
}

/// Bounded in-process cache of whole progress reports, keyed by user.
pub struct ProgressCache {
    capacity: usize,
    state: RwLock<CacheState>,
}

impl ProgressCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub async fn lookup(&self, user_id: &str) -> Lookup {
        let state = self.state.read().await;
        match state.entries.get(user_id) {
            Some(cached) => Lookup::Hit(cached.report.clone()),
            None => Lookup::Miss(FillTicket(state.generation)),
        }
    }

    /// Stores a freshly computed report unless an invalidation landed after
    /// `ticket` was taken. Returns whether the report was kept.
    pub async fn fill(&self, user_id: &str, report: ProgressReport, ticket: FillTicket) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let mut state = self.state.write().await;
        if state.generation != ticket.0 {
            tracing::debug!("Dropping stale progress report for {}", user_id);
            return false;
        }

        if !state.entries.contains_key(user_id) && state.entries.len() >= self.capacity {
            // Oldest fill goes first
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, cached)| cached.sequence)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                state.entries.remove(&key);
            }
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state
            .entries
            .insert(user_id.to_string(), CachedReport { report, sequence });
        PROGRESS_CACHE_ENTRIES.set(state.entries.len() as i64);
        true
    }

    pub async fn invalidate(&self, user_id: &str) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.entries.remove(user_id);
        PROGRESS_CACHE_ENTRIES.set(state.entries.len() as i64);
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}
