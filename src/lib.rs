// Library crate for the Thaana typing trainer
// This file exposes the public API for the server binary and integration tests

pub mod client;
pub mod config;
pub mod corpus;
pub mod leaderboard;
pub mod routes;
pub mod session;
pub mod shared;
pub mod typing;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use routes::build_router;
pub use shared::{AppError, AppState};
pub use typing::{KeyEvent, Mode, TestConfig, TestResult, TypingSession, WordPool};
