use tracing::{debug, info, warn};

use super::api::{ClientError, LeaderboardClient};
use crate::leaderboard::ScoreRecord;
use crate::typing::{TestConfig, TestResult};

/// What the leaderboard panel should show
#[derive(Debug, Clone, PartialEq)]
pub enum BoardView {
    Loading,
    Ready(Vec<ScoreRecord>),
    /// Fetch failed; showing the last board that loaded for this selection
    Cached(Vec<ScoreRecord>),
    /// Fetch failed and nothing was ever loaded for this selection
    Unavailable,
}

/// Ticket for one fetch. Results are applied only while the ticket matches
/// the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardRequest {
    pub test: TestConfig,
    generation: u64,
}

/// Leaderboard view model: tracks the selected mode/target and ignores
/// responses for selections the user already moved away from.
#[derive(Debug)]
pub struct LeaderboardBoard {
    selected: TestConfig,
    generation: u64,
    view: BoardView,
    last_known: Option<(TestConfig, Vec<ScoreRecord>)>,
}

impl LeaderboardBoard {
    pub fn new(selected: TestConfig) -> Self {
        Self {
            selected,
            generation: 0,
            view: BoardView::Loading,
            last_known: None,
        }
    }

    pub fn selected(&self) -> TestConfig {
        self.selected
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    /// Switches selection and returns the ticket for the fetch to issue
    pub fn select(&mut self, test: TestConfig) -> BoardRequest {
        self.selected = test;
        self.generation += 1;
        self.view = BoardView::Loading;

        BoardRequest {
            test,
            generation: self.generation,
        }
    }

    /// Applies a fetch result. Returns false when the ticket is stale.
    pub fn apply(
        &mut self,
        request: BoardRequest,
        result: Result<Vec<ScoreRecord>, ClientError>,
    ) -> bool {
        if request.generation != self.generation {
            debug!(
                requested = request.generation,
                current = self.generation,
                "Dropping stale leaderboard response"
            );
            return false;
        }

        self.view = match result {
            Ok(board) => {
                self.last_known = Some((request.test, board.clone()));
                BoardView::Ready(board)
            }
            Err(e) => {
                warn!(error = %e, "Leaderboard fetch failed");
                match &self.last_known {
                    Some((test, board)) if *test == request.test => BoardView::Cached(board.clone()),
                    _ => BoardView::Unavailable,
                }
            }
        };
        true
    }

    /// Fetches the current selection
    pub async fn refresh(&mut self, client: &LeaderboardClient) -> &BoardView {
        let request = self.select(self.selected);
        let result = client.top(request.test).await;
        self.apply(request, result);
        &self.view
    }
}

/// Tracks saving one finished test to the leaderboard: cache the score for
/// the session, then claim it under a name. A failed claim keeps the name
/// so the user can retry.
#[derive(Debug, Clone)]
pub struct ScoreSubmission {
    result: TestResult,
    test: TestConfig,
    cached: bool,
    saved_id: Option<i64>,
    pending_name: Option<String>,
}

impl ScoreSubmission {
    pub fn new(result: TestResult, test: TestConfig) -> Self {
        Self {
            result,
            test,
            cached: false,
            saved_id: None,
            pending_name: None,
        }
    }

    pub fn result(&self) -> TestResult {
        self.result
    }

    pub fn test(&self) -> TestConfig {
        self.test
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn has_saved(&self) -> bool {
        self.saved_id.is_some()
    }

    pub fn saved_id(&self) -> Option<i64> {
        self.saved_id
    }

    pub fn pending_name(&self) -> Option<&str> {
        self.pending_name.as_deref()
    }

    /// Sends the score to the session cache
    pub async fn cache(&mut self, client: &LeaderboardClient) -> Result<(), ClientError> {
        client.cache_score(self.result, self.test).await?;
        self.cached = true;
        Ok(())
    }

    /// Claims the cached score; a no-op once saved
    pub async fn save(
        &mut self,
        client: &LeaderboardClient,
        name: &str,
        captcha_token: Option<&str>,
    ) -> Result<i64, ClientError> {
        if let Some(id) = self.saved_id {
            return Ok(id);
        }

        self.pending_name = Some(name.to_string());
        if !self.cached {
            self.cache(client).await?;
        }

        let id = client.claim(name, captcha_token).await?;
        info!(id, "Score saved");

        self.saved_id = Some(id);
        self.pending_name = None;
        Ok(id)
    }

    /// Repeats the last failed `save` with the same name
    pub async fn retry(
        &mut self,
        client: &LeaderboardClient,
        captcha_token: Option<&str>,
    ) -> Result<i64, ClientError> {
        if let Some(id) = self.saved_id {
            return Ok(id);
        }
        let name = self
            .pending_name
            .clone()
            .ok_or(ClientError::NothingToRetry)?;

        self.save(client, &name, captcha_token).await
    }
}
