use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    captcha::CaptchaVerifier,
    models::{PendingScore, ScoreRecord, LEADERBOARD_SIZE},
    pending::PendingScoreStore,
    repository::ScoreRepository,
};
use crate::config::AllowedConfigs;
use crate::shared::AppError;
use crate::typing::{TestConfig, TestResult};

pub const MAX_NAME_CHARS: usize = 32;

/// Ranked reads and the two-step cache-then-claim write path.
///
/// A score only reaches the table through `cache_score` followed by
/// `claim_score` from the same session, so the numbers are never taken from
/// the claim request itself.
pub struct LeaderboardService {
    scores: Arc<dyn ScoreRepository>,
    pending: Arc<dyn PendingScoreStore>,
    captcha: Arc<dyn CaptchaVerifier>,
    allowed: AllowedConfigs,
}

impl LeaderboardService {
    pub fn new(
        scores: Arc<dyn ScoreRepository>,
        pending: Arc<dyn PendingScoreStore>,
        captcha: Arc<dyn CaptchaVerifier>,
        allowed: AllowedConfigs,
    ) -> Self {
        Self {
            scores,
            pending,
            captcha,
            allowed,
        }
    }

    pub fn allowed(&self) -> &AllowedConfigs {
        &self.allowed
    }

    pub fn captcha_enforced(&self) -> bool {
        self.captcha.is_enforced()
    }

    fn check_config(&self, test: TestConfig) -> Result<(), AppError> {
        if !self.allowed.contains(test) {
            return Err(AppError::Validation(format!(
                "{} is not an allowed target for {} mode",
                test.target, test.mode
            )));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_top(&self, test: TestConfig) -> Result<Vec<ScoreRecord>, AppError> {
        self.check_config(test)?;

        let board = self.scores.list_top(test, LEADERBOARD_SIZE).await?;
        debug!(entries = board.len(), "Leaderboard fetched");
        Ok(board)
    }

    /// Stores the session's latest score, replacing any earlier one
    #[instrument(skip(self))]
    pub async fn cache_score(
        &self,
        session_id: &str,
        result: TestResult,
        test: TestConfig,
    ) -> Result<(), AppError> {
        self.check_config(test)?;

        if result.accuracy > 100 {
            return Err(AppError::Validation(
                "accuracy must be between 0 and 100".to_string(),
            ));
        }

        self.pending
            .put(session_id, PendingScore::new(result, test))
            .await;

        info!(
            session_id = %session_id,
            wpm = result.wpm,
            mode = %test.mode,
            target = test.target,
            "Score cached for session"
        );
        Ok(())
    }

    /// Publishes the session's cached score under `name`
    #[instrument(skip(self, captcha_token))]
    pub async fn claim_score(
        &self,
        session_id: &str,
        name: &str,
        captcha_token: Option<&str>,
    ) -> Result<ScoreRecord, AppError> {
        let name = validate_name(name)?;

        if !self.pending.contains(session_id, Utc::now()).await {
            warn!(session_id = %session_id, "Claim without pending score");
            return Err(AppError::NoPendingScore);
        }

        if self.captcha.is_enforced() {
            let token = captcha_token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or(AppError::CaptchaRequired)?;

            if !self.captcha.verify(token).await? {
                warn!(session_id = %session_id, "Captcha rejected");
                return Err(AppError::CaptchaFailed);
            }
        }

        // A concurrent claim may have won since the check above
        let pending = self
            .pending
            .take(session_id, Utc::now())
            .await
            .ok_or(AppError::NoPendingScore)?;

        match self.scores.insert(&pending.clone().into_new_score(name)).await {
            Ok(record) => {
                info!(
                    session_id = %session_id,
                    id = record.id,
                    wpm = record.wpm,
                    "Score claimed"
                );
                Ok(record)
            }
            Err(e) => {
                // Keep the score claimable so the user can retry
                self.pending.restore(session_id, pending).await;
                Err(e)
            }
        }
    }

    /// Administrative: removes every stored score
    #[instrument(skip(self))]
    pub async fn wipe(&self) -> Result<u64, AppError> {
        let removed = self.scores.wipe().await?;
        warn!(removed, "Leaderboard wiped");
        Ok(removed)
    }

    pub async fn purge_expired_pending(&self) -> usize {
        self.pending.purge_expired(Utc::now()).await
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_CHARS} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(AppError::Validation(
            "name contains control characters".to_string(),
        ));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::captcha::DisabledCaptcha;
    use crate::leaderboard::models::NewScore;
    use crate::leaderboard::pending::InMemoryPendingScores;
    use crate::leaderboard::repository::InMemoryScoreRepository;
    use crate::shared::test_utils::StaticCaptcha;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Store that is always down
    struct BrokenRepository;

    #[async_trait]
    impl ScoreRepository for BrokenRepository {
        async fn insert(&self, _score: &NewScore) -> Result<ScoreRecord, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
        async fn list_top(
            &self,
            _test: TestConfig,
            _limit: usize,
        ) -> Result<Vec<ScoreRecord>, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
        async fn wipe(&self) -> Result<u64, AppError> {
            Ok(0)
        }
    }

    fn result(wpm: u32) -> TestResult {
        TestResult {
            wpm,
            raw_wpm: wpm + 3,
            accuracy: 97,
        }
    }

    fn service_with(
        scores: Arc<dyn ScoreRepository>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> LeaderboardService {
        LeaderboardService::new(
            scores,
            Arc::new(InMemoryPendingScores::new(Duration::from_secs(600))),
            captcha,
            AllowedConfigs::default(),
        )
    }

    fn open_service() -> LeaderboardService {
        service_with(
            Arc::new(InMemoryScoreRepository::new()),
            Arc::new(DisabledCaptcha),
        )
    }

    #[tokio::test]
    async fn claim_without_cache_fails_and_inserts_nothing() {
        let service = open_service();

        let err = service.claim_score("s1", "aisha", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoPendingScore));
        assert!(service
            .list_top(TestConfig::time(30))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn cached_score_can_be_claimed_once() {
        let service = open_service();
        service
            .cache_score("s1", result(72), TestConfig::time(30))
            .await
            .unwrap();

        let record = service.claim_score("s1", "  aisha ", None).await.unwrap();
        assert_eq!(record.name, "aisha");
        assert_eq!(record.wpm, 72);
        assert_eq!(record.raw_wpm, 75);
        assert_eq!(record.config, 30);

        let err = service.claim_score("s1", "aisha", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoPendingScore));
        assert_eq!(service.list_top(TestConfig::time(30)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn claim_uses_latest_cached_score() {
        let service = open_service();
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();
        service
            .cache_score("s1", result(88), TestConfig::words(25))
            .await
            .unwrap();

        let record = service.claim_score("s1", "ali", None).await.unwrap();
        assert_eq!(record.wpm, 88);
        assert_eq!(record.config, 25);
    }

    #[tokio::test]
    async fn claims_are_scoped_to_the_session() {
        let service = open_service();
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();

        let err = service.claim_score("s2", "mallory", None).await.unwrap_err();
        assert!(matches!(err, AppError::NoPendingScore));
        assert!(service.claim_score("s1", "ali", None).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_claims_succeed_at_most_once() {
        let service = Arc::new(open_service());
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .claim_score("s1", &format!("racer-{i}"), None)
                        .await
                        .is_ok()
                })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn captcha_required_when_enforced() {
        let service = service_with(
            Arc::new(InMemoryScoreRepository::new()),
            Arc::new(StaticCaptcha { accept: true }),
        );
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();

        let err = service.claim_score("s1", "ali", None).await.unwrap_err();
        assert!(matches!(err, AppError::CaptchaRequired));
        let err = service.claim_score("s1", "ali", Some("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::CaptchaRequired));

        // The pending score survives the failed attempts
        assert!(service.claim_score("s1", "ali", Some("tok")).await.is_ok());
    }

    #[tokio::test]
    async fn rejected_captcha_keeps_score_pending() {
        let service = service_with(
            Arc::new(InMemoryScoreRepository::new()),
            Arc::new(StaticCaptcha { accept: false }),
        );
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();

        let err = service.claim_score("s1", "ali", Some("bad")).await.unwrap_err();
        assert!(matches!(err, AppError::CaptchaFailed));
        assert!(service.pending.contains("s1", Utc::now()).await);
    }

    #[tokio::test]
    async fn failed_insert_keeps_score_claimable() {
        let service = service_with(Arc::new(BrokenRepository), Arc::new(DisabledCaptcha));
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();

        let err = service.claim_score("s1", "ali", None).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(service.pending.contains("s1", Utc::now()).await);
    }

    #[tokio::test]
    async fn list_top_surfaces_store_errors() {
        let service = service_with(Arc::new(BrokenRepository), Arc::new(DisabledCaptcha));
        let err = service.list_top(TestConfig::time(30)).await.unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn rejects_disallowed_configs_and_bad_accuracy() {
        let service = open_service();

        let err = service
            .cache_score("s1", result(40), TestConfig::time(45))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut bad = result(40);
        bad.accuracy = 101;
        let err = service
            .cache_score("s1", bad, TestConfig::time(30))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(matches!(
            service.list_top(TestConfig::words(7)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn leaderboard_example_ranks_descending() {
        let service = open_service();
        for (i, wpm) in [80, 60, 95, 40, 70].into_iter().enumerate() {
            let session = format!("s{i}");
            service
                .cache_score(&session, result(wpm), TestConfig::time(30))
                .await
                .unwrap();
            service.claim_score(&session, "p", None).await.unwrap();
        }

        let wpms: Vec<u32> = service
            .list_top(TestConfig::time(30))
            .await
            .unwrap()
            .iter()
            .map(|r| r.wpm)
            .collect();
        assert_eq!(wpms, vec![95, 80, 70, 60, 40]);
    }

    #[tokio::test]
    async fn wipe_clears_the_board() {
        let service = open_service();
        service
            .cache_score("s1", result(40), TestConfig::time(30))
            .await
            .unwrap();
        service.claim_score("s1", "ali", None).await.unwrap();

        assert_eq!(service.wipe().await.unwrap(), 1);
        assert!(service
            .list_top(TestConfig::time(30))
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn validates_names() {
        assert_eq!(validate_name(" ޢާއިޝާ ").unwrap(), "ޢާއިޝާ");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_CHARS + 1)).is_err());
        assert!(validate_name("bad\nname").is_err());
    }
}
