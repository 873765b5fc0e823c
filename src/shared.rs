use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::leaderboard::service::LeaderboardService;
use crate::session::service::SessionService;
use crate::typing::WordPool;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session_service: Arc<SessionService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub word_pool: Arc<WordPool>,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        session_service: Arc<SessionService>,
        leaderboard_service: Arc<LeaderboardService>,
        word_pool: Arc<WordPool>,
    ) -> Self {
        Self {
            config,
            session_service,
            leaderboard_service,
            word_pool,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No pending score for this session")]
    NoPendingScore,

    #[error("Captcha token is required")]
    CaptchaRequired,

    #[error("Captcha verification failed")]
    CaptchaFailed,

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::NoPendingScore
            | AppError::CaptchaRequired
            | AppError::CaptchaFailed => StatusCode::BAD_REQUEST,
            AppError::JwtError(_) | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Missing or malformed JSON bodies are validation failures, not 422s
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            // Store and upstream details stay in the logs
            AppError::DatabaseError(_) | AppError::Upstream(_) => {
                tracing::error!(error = %self, "Request failed");
                "Service temporarily unavailable".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::config::AllowedConfigs;
    use crate::leaderboard::captcha::{CaptchaVerifier, DisabledCaptcha};
    use crate::leaderboard::pending::{InMemoryPendingScores, PendingScoreStore};
    use crate::leaderboard::repository::{InMemoryScoreRepository, ScoreRepository};
    use crate::session::token::TokenConfig;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Captcha verifier with a fixed answer
    pub struct StaticCaptcha {
        pub accept: bool,
    }

    #[async_trait]
    impl CaptchaVerifier for StaticCaptcha {
        fn is_enforced(&self) -> bool {
            true
        }

        async fn verify(&self, _token: &str) -> Result<bool, AppError> {
            Ok(self.accept)
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        scores: Option<Arc<dyn ScoreRepository>>,
        pending: Option<Arc<dyn PendingScoreStore>>,
        captcha: Option<Arc<dyn CaptchaVerifier>>,
        word_pool: Option<Arc<WordPool>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                scores: None,
                pending: None,
                captcha: None,
                word_pool: None,
            }
        }

        pub fn with_score_repository(mut self, repo: Arc<dyn ScoreRepository>) -> Self {
            self.scores = Some(repo);
            self
        }

        pub fn with_pending_store(mut self, pending: Arc<dyn PendingScoreStore>) -> Self {
            self.pending = Some(pending);
            self
        }

        pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
            self.captcha = Some(captcha);
            self
        }

        pub fn with_word_pool(mut self, word_pool: Arc<WordPool>) -> Self {
            self.word_pool = Some(word_pool);
            self
        }

        pub fn build(self) -> AppState {
            let config = AppConfig::default();
            let leaderboard_service = LeaderboardService::new(
                self.scores
                    .unwrap_or_else(|| Arc::new(InMemoryScoreRepository::new())),
                self.pending.unwrap_or_else(|| {
                    Arc::new(InMemoryPendingScores::new(Duration::from_secs(3600)))
                }),
                self.captcha.unwrap_or_else(|| Arc::new(DisabledCaptcha)),
                AllowedConfigs::default(),
            );
            let session_service =
                SessionService::new(TokenConfig::new("test-secret".to_string(), 1));

            AppState::new(
                Arc::new(config),
                Arc::new(session_service),
                Arc::new(leaderboard_service),
                self.word_pool
                    .unwrap_or_else(|| Arc::new(WordPool::builtin())),
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
