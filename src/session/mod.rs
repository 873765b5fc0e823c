// Public API - what other modules can use
pub use handlers::create_session;
pub use middleware::session_auth;
pub use types::{SessionClaims, SessionResponse};

// Internal modules
pub mod generators;
mod handlers;
mod middleware;
pub mod service;
pub mod token;
mod types;
