use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use thaana_typer::{
    build_router,
    client::LeaderboardClient,
    config::AllowedConfigs,
    leaderboard::{
        captcha::{CaptchaVerifier, DisabledCaptcha},
        pending::InMemoryPendingScores,
        repository::InMemoryScoreRepository,
        LeaderboardService,
    },
    session::{service::SessionService, token::TokenConfig},
    typing::KeyEvent,
    AppConfig, AppState, WordPool,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// The real router served on an ephemeral local port
pub struct TestServer {
    pub base_url: String,
    pub scores: Arc<InMemoryScoreRepository>,
    pub pending: Arc<InMemoryPendingScores>,
    _server_handle: JoinHandle<()>,
}

impl TestServer {
    pub fn client(&self) -> LeaderboardClient {
        LeaderboardClient::new(self.base_url.clone()).unwrap()
    }

    /// A client that already holds a session token
    pub async fn session_client(&self) -> LeaderboardClient {
        let client = self.client();
        client.create_session().await.unwrap();
        client
    }
}

pub struct TestServerBuilder {
    captcha: Arc<dyn CaptchaVerifier>,
    pending_ttl: Duration,
    word_pool: WordPool,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        Self {
            captcha: Arc::new(DisabledCaptcha),
            pending_ttl: Duration::from_secs(3600),
            word_pool: WordPool::builtin(),
        }
    }

    pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = captcha;
        self
    }

    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = ttl;
        self
    }

    pub fn with_word_pool(mut self, word_pool: WordPool) -> Self {
        self.word_pool = word_pool;
        self
    }

    pub async fn build(self) -> TestServer {
        let scores = Arc::new(InMemoryScoreRepository::new());
        let pending = Arc::new(InMemoryPendingScores::new(self.pending_ttl));

        let leaderboard_service = LeaderboardService::new(
            scores.clone(),
            pending.clone(),
            self.captcha,
            AllowedConfigs::default(),
        );
        let session_service =
            SessionService::new(TokenConfig::new("integration-secret".to_string(), 1));

        let config = AppConfig {
            recaptcha_site_key: Some("site-key".to_string()),
            ..AppConfig::default()
        };
        let state = AppState::new(
            Arc::new(config),
            Arc::new(session_service),
            Arc::new(leaderboard_service),
            Arc::new(self.word_pool),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        TestServer {
            base_url: format!("http://{addr}"),
            scores,
            pending,
            _server_handle: server_handle,
        }
    }
}

/// Raw keystrokes for a line of Latin phonetic input; spaces become `Space`
pub fn keys(input: &str) -> Vec<KeyEvent> {
    input
        .chars()
        .map(|c| if c == ' ' { KeyEvent::Space } else { KeyEvent::Char(c) })
        .collect()
}
