use axum::{extract::State, http::header, response::IntoResponse, Json};
use tracing::{info, instrument};

use super::middleware::SESSION_COOKIE;
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new session
///
/// POST /api/session
/// Returns the signed session token and also sets it as an HttpOnly cookie
#[instrument(name = "create_session", skip(state))]
pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session = state.session_service.create_session().await?;

    let max_age = state.session_service.expiration_days() * 24 * 60 * 60;
    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}",
        session.session_id
    );

    info!(
        session_id_length = session.session_id.len(),
        "Session issued"
    );

    Ok(([(header::SET_COOKIE, cookie)], Json(session)))
}
