use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typing::{Mode, TestConfig, TestResult};

/// Maximum entries returned for one leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

/// Persisted leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: i64,
    pub name: String,
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub mode: Mode,
    pub config: u32,
    pub created_at: DateTime<Utc>,
}

/// A validated score about to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub name: String,
    pub result: TestResult,
    pub test: TestConfig,
}

/// Score computed by a finished test, waiting for its session to claim it
/// under a display name.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingScore {
    pub result: TestResult,
    pub test: TestConfig,
    pub cached_at: DateTime<Utc>,
}

impl PendingScore {
    pub fn new(result: TestResult, test: TestConfig) -> Self {
        Self {
            result,
            test,
            cached_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.cached_at > ttl
    }

    pub fn into_new_score(self, name: String) -> NewScore {
        NewScore {
            name,
            result: self.result,
            test: self.test,
        }
    }
}

/// Orders by wpm descending; earlier submissions win ties.
pub fn rank(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| {
        b.wpm
            .cmp(&a.wpm)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
