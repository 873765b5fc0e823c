// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use handlers::{get_leaderboard, get_public_config, post_leaderboard, post_session_score};
pub use models::{ScoreRecord, LEADERBOARD_SIZE};
pub use service::LeaderboardService;
pub use types::{
    ClaimScoreRequest, ClaimScoreResponse, LeaderboardQuery, PublicConfigResponse,
    SessionScoreRequest, SuccessResponse,
};

// Internal modules
pub mod captcha;
mod cleanup_task;
mod handlers;
pub mod models;
pub mod pending;
pub mod repository;
pub mod service;
mod types;
