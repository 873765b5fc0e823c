use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thaana_typer::{
    build_router,
    leaderboard::{
        captcha::{CaptchaVerifier, DisabledCaptcha, RecaptchaVerifier},
        pending::InMemoryPendingScores,
        repository::{InMemoryScoreRepository, PostgresScoreRepository, ScoreRepository},
        start_cleanup_task, CleanupConfig, LeaderboardService,
    },
    session::{service::SessionService, token::TokenConfig},
    AppConfig, AppState, WordPool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real env vars still apply
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thaana_typer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Thaana typing trainer server");

    let config = AppConfig::from_env().context("invalid configuration")?;

    let scores: Arc<dyn ScoreRepository> = match &config.database_url {
        Some(url) => {
            info!("Using PostgreSQL score repository");
            Arc::new(
                PostgresScoreRepository::connect(url)
                    .await
                    .context("failed to open score database")?,
            )
        }
        None => {
            warn!("DATABASE_URL not set; scores are kept in memory");
            Arc::new(InMemoryScoreRepository::new())
        }
    };

    let captcha: Arc<dyn CaptchaVerifier> = match &config.recaptcha_secret {
        Some(secret) => Arc::new(RecaptchaVerifier::new(secret.clone())?),
        None => {
            warn!("RECAPTCHA_SECRET not set; leaderboard claims are open");
            Arc::new(DisabledCaptcha)
        }
    };

    let word_pool = match &config.words_file {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            WordPool::from_text(&text)?
        }
        None => WordPool::builtin(),
    };
    info!(words = word_pool.len(), "Word corpus loaded");

    let leaderboard_service = Arc::new(LeaderboardService::new(
        scores,
        Arc::new(InMemoryPendingScores::new(config.pending_score_ttl)),
        captcha,
        config.allowed.clone(),
    ));
    let session_service = Arc::new(SessionService::new(TokenConfig::new(
        config.jwt_secret.clone(),
        config.session_expiration_days,
    )));

    // Drop pending scores nobody claimed
    tokio::spawn(start_cleanup_task(
        Arc::clone(&leaderboard_service),
        CleanupConfig {
            cleanup_interval: config.cleanup_interval,
        },
    ));

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(
        Arc::new(config),
        session_service,
        leaderboard_service,
        Arc::new(word_pool),
    );
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
