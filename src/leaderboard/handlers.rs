use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, instrument};

use super::{
    models::ScoreRecord,
    types::{
        ClaimScoreRequest, ClaimScoreResponse, LeaderboardQuery, PublicConfigResponse,
        SessionScoreRequest, SuccessResponse,
    },
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};
use crate::typing::TestConfig;

/// HTTP handler for reading one leaderboard
///
/// GET /api/leaderboard?mode=time&config=30
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<ScoreRecord>>, AppError> {
    let test = TestConfig {
        mode: query.mode,
        target: query.config,
    };
    let board = state.leaderboard_service.list_top(test).await?;

    Ok(Json(board))
}

/// HTTP handler for caching the result of a finished test
///
/// POST /api/session-score (session required)
#[instrument(name = "post_session_score", skip(state, claims), fields(session_id = %claims.session_id))]
pub async fn post_session_score(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    request: Result<Json<SessionScoreRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(request) = request?;

    state
        .leaderboard_service
        .cache_score(&claims.session_id, request.result(), request.test())
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// HTTP handler for publishing the cached score under a name
///
/// POST /api/leaderboard (session required)
#[instrument(name = "post_leaderboard", skip(state, claims, request), fields(session_id = %claims.session_id))]
pub async fn post_leaderboard(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    request: Result<Json<ClaimScoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClaimScoreResponse>), AppError> {
    let Json(request) = request?;

    let record = state
        .leaderboard_service
        .claim_score(
            &claims.session_id,
            &request.name,
            request.recaptcha_token.as_deref(),
        )
        .await?;

    info!(id = record.id, name = %record.name, "Leaderboard entry created");

    Ok((StatusCode::CREATED, Json(ClaimScoreResponse { id: record.id })))
}

/// HTTP handler for the settings the client needs before a test
///
/// GET /api/config
#[instrument(name = "get_public_config", skip(state))]
pub async fn get_public_config(State(state): State<AppState>) -> Json<PublicConfigResponse> {
    let site_key = if state.leaderboard_service.captcha_enforced() {
        state.config.recaptcha_site_key.clone()
    } else {
        None
    };

    Json(PublicConfigResponse::new(
        site_key,
        state.leaderboard_service.allowed(),
    ))
}
