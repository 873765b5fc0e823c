use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, instrument};

use super::service::LeaderboardService;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to sweep the pending-score cache
    pub cleanup_interval: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(5 * 60), // 5 minutes
        }
    }
}

/// Starts the background task that drops pending scores nobody claimed
#[instrument(skip(leaderboard_service))]
pub async fn start_cleanup_task(leaderboard_service: Arc<LeaderboardService>, config: CleanupConfig) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        "Starting pending score cleanup background task"
    );

    // tokio's interval panics on a zero period
    let mut cleanup_interval = interval(config.cleanup_interval.max(MIN_INTERVAL));

    loop {
        cleanup_interval.tick().await;
        purge_once(&leaderboard_service).await;
    }
}

async fn purge_once(leaderboard_service: &LeaderboardService) -> usize {
    let purged = leaderboard_service.purge_expired_pending().await;

    if purged > 0 {
        info!(purged, "Expired pending scores removed");
    } else {
        debug!("No expired pending scores");
    }
    purged
}
