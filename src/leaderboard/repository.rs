use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use std::str::FromStr;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::{rank, NewScore, ScoreRecord};
use crate::shared::AppError;
use crate::typing::{Mode, TestConfig};

/// Append-only store of claimed scores
#[async_trait]
pub trait ScoreRepository: Send + Sync {
    async fn insert(&self, score: &NewScore) -> Result<ScoreRecord, AppError>;

    /// Best scores for one mode/target, wpm descending
    async fn list_top(&self, test: TestConfig, limit: usize)
        -> Result<Vec<ScoreRecord>, AppError>;

    /// Administrative full clear; returns the number of removed rows
    async fn wipe(&self) -> Result<u64, AppError>;
}

/// In-memory implementation of ScoreRepository for development and testing
#[derive(Debug, Default)]
pub struct InMemoryScoreRepository {
    inner: RwLock<InMemoryScores>,
}

#[derive(Debug, Default)]
struct InMemoryScores {
    records: Vec<ScoreRecord>,
    next_id: i64,
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

#[async_trait]
impl ScoreRepository for InMemoryScoreRepository {
    #[instrument(skip(self, score))]
    async fn insert(&self, score: &NewScore) -> Result<ScoreRecord, AppError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;

        let record = ScoreRecord {
            id: inner.next_id,
            name: score.name.clone(),
            wpm: score.result.wpm,
            raw_wpm: score.result.raw_wpm,
            accuracy: score.result.accuracy,
            mode: score.test.mode,
            config: score.test.target,
            created_at: Utc::now(),
        };
        inner.records.push(record.clone());

        debug!(id = record.id, wpm = record.wpm, "Score stored in memory");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn list_top(
        &self,
        test: TestConfig,
        limit: usize,
    ) -> Result<Vec<ScoreRecord>, AppError> {
        let inner = self.inner.read().await;
        let mut board: Vec<ScoreRecord> = inner
            .records
            .iter()
            .filter(|r| r.mode == test.mode && r.config == test.target)
            .cloned()
            .collect();

        rank(&mut board);
        board.truncate(limit);
        Ok(board)
    }

    #[instrument(skip(self))]
    async fn wipe(&self) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        let removed = inner.records.len() as u64;
        inner.records.clear();

        info!(removed, "In-memory scores wiped");
        Ok(removed)
    }
}

/// PostgreSQL implementation of the score repository
pub struct PostgresScoreRepository {
    pool: PgPool,
}

impl PostgresScoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and makes sure the scores table exists
    #[instrument(skip(url))]
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to connect to database");
                AppError::DatabaseError(e.to_string())
            })?;

        let repository = Self::new(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }

    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                wpm INTEGER NOT NULL CHECK (wpm >= 0),
                raw_wpm INTEGER NOT NULL CHECK (raw_wpm >= 0),
                accuracy INTEGER NOT NULL CHECK (accuracy BETWEEN 0 AND 100),
                mode TEXT NOT NULL CHECK (mode IN ('time', 'words')),
                config INTEGER NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS scores_board_idx ON scores (mode, config, wpm DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        debug!("Scores schema ready");
        Ok(())
    }
}

fn database_error(e: sqlx::Error) -> AppError {
    warn!(error = %e, "Score query failed");
    AppError::DatabaseError(e.to_string())
}

fn to_column(value: u32, field: &str) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| AppError::Validation(format!("{field} is out of range")))
}

fn from_column(row: &PgRow, column: &str) -> Result<u32, AppError> {
    let value: i32 = row.try_get(column).map_err(database_error)?;
    u32::try_from(value)
        .map_err(|_| AppError::DatabaseError(format!("negative {column} in scores table")))
}

fn record_from_row(row: &PgRow) -> Result<ScoreRecord, AppError> {
    let mode: String = row.try_get("mode").map_err(database_error)?;

    Ok(ScoreRecord {
        id: row.try_get("id").map_err(database_error)?,
        name: row.try_get("name").map_err(database_error)?,
        wpm: from_column(row, "wpm")?,
        raw_wpm: from_column(row, "raw_wpm")?,
        accuracy: from_column(row, "accuracy")?,
        mode: Mode::from_str(&mode)
            .map_err(|_| AppError::DatabaseError(format!("unknown mode {mode:?}")))?,
        config: from_column(row, "config")?,
        created_at: row.try_get("created_at").map_err(database_error)?,
    })
}

#[async_trait]
impl ScoreRepository for PostgresScoreRepository {
    #[instrument(skip(self, score))]
    async fn insert(&self, score: &NewScore) -> Result<ScoreRecord, AppError> {
        let row = sqlx::query(
            "INSERT INTO scores (name, wpm, raw_wpm, accuracy, mode, config) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, name, wpm, raw_wpm, accuracy, mode, config, created_at",
        )
        .bind(&score.name)
        .bind(to_column(score.result.wpm, "wpm")?)
        .bind(to_column(score.result.raw_wpm, "raw_wpm")?)
        .bind(to_column(score.result.accuracy, "accuracy")?)
        .bind(score.test.mode.as_ref())
        .bind(to_column(score.test.target, "config")?)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)?;

        let record = record_from_row(&row)?;
        debug!(id = record.id, wpm = record.wpm, "Score stored in database");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn list_top(
        &self,
        test: TestConfig,
        limit: usize,
    ) -> Result<Vec<ScoreRecord>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, wpm, raw_wpm, accuracy, mode, config, created_at \
             FROM scores WHERE mode = $1 AND config = $2 \
             ORDER BY wpm DESC, created_at ASC, id ASC LIMIT $3",
        )
        .bind(test.mode.as_ref())
        .bind(to_column(test.target, "config")?)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn wipe(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM scores")
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        info!(removed = result.rows_affected(), "Scores table wiped");
        Ok(result.rows_affected())
    }
}
