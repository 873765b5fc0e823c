use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::shared::{AppError, AppState};

pub const MAX_WORDS_PER_REQUEST: usize = 500;

#[derive(Debug, Deserialize)]
pub struct WordsQuery {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordsResponse {
    pub words: Vec<String>,
}

/// HTTP handler serving a random sample of the configured corpus
///
/// GET /api/words?count=50
#[instrument(name = "get_words", skip(state))]
pub async fn get_words(
    State(state): State<AppState>,
    Query(query): Query<WordsQuery>,
) -> Result<Json<WordsResponse>, AppError> {
    if query.count == 0 || query.count > MAX_WORDS_PER_REQUEST {
        return Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_WORDS_PER_REQUEST}"
        )));
    }

    let words = state.word_pool.sample(query.count);
    debug!(count = words.len(), corpus = state.word_pool.len(), "Words sampled");

    Ok(Json(WordsResponse { words }))
}
