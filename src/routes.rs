use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::corpus;
use crate::leaderboard;
use crate::session;
use crate::shared::AppState;

/// Builds the HTTP API. Score writes sit behind the session middleware; reads
/// and session issuance are public.
pub fn build_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/session-score", post(leaderboard::post_session_score))
        .route("/api/leaderboard", post(leaderboard::post_leaderboard))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            session::session_auth,
        ));

    Router::new()
        .route("/", get(|| async { "Thaana typing trainer" }))
        .route("/api/session", post(session::create_session))
        .route("/api/config", get(leaderboard::get_public_config))
        .route("/api/words", get(corpus::get_words))
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
