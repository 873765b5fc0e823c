// HTTP client for the leaderboard API plus the view state a front end
// keeps around it.

pub use api::{ClientError, LeaderboardClient};
pub use board::{BoardRequest, BoardView, LeaderboardBoard, ScoreSubmission};

mod api;
mod board;
