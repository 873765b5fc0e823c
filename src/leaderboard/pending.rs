use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use super::models::PendingScore;

/// Per-session cache of computed-but-unclaimed scores. At most one entry per
/// session; a newer score replaces the older one.
#[async_trait]
pub trait PendingScoreStore: Send + Sync {
    async fn put(&self, session_id: &str, score: PendingScore);

    /// Removes and returns the live entry for the session, if any. Expired
    /// entries are dropped and reported as absent.
    async fn take(&self, session_id: &str, now: DateTime<Utc>) -> Option<PendingScore>;

    /// Whether a live entry exists, without consuming it
    async fn contains(&self, session_id: &str, now: DateTime<Utc>) -> bool;

    /// Puts a taken entry back unless a newer one arrived meanwhile
    async fn restore(&self, session_id: &str, score: PendingScore);

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize;
}

pub struct InMemoryPendingScores {
    entries: Mutex<HashMap<String, PendingScore>>,
    ttl: chrono::Duration,
}

impl InMemoryPendingScores {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365)),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl PendingScoreStore for InMemoryPendingScores {
    #[instrument(skip(self, score))]
    async fn put(&self, session_id: &str, score: PendingScore) {
        let replaced = self
            .entries
            .lock()
            .await
            .insert(session_id.to_string(), score)
            .is_some();

        debug!(replaced, "Pending score cached");
    }

    #[instrument(skip(self))]
    async fn take(&self, session_id: &str, now: DateTime<Utc>) -> Option<PendingScore> {
        let score = self.entries.lock().await.remove(session_id)?;

        if score.is_expired(self.ttl, now) {
            debug!("Pending score expired before claim");
            return None;
        }
        Some(score)
    }

    async fn contains(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        self.entries
            .lock()
            .await
            .get(session_id)
            .is_some_and(|score| !score.is_expired(self.ttl, now))
    }

    #[instrument(skip(self, score))]
    async fn restore(&self, session_id: &str, score: PendingScore) {
        self.entries
            .lock()
            .await
            .entry(session_id.to_string())
            .or_insert(score);
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, score| !score.is_expired(self.ttl, now));
        before - entries.len()
    }
}
