use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::typing::{Mode, TestConfig};

const DEFAULT_TIME_CONFIGS: &[u32] = &[15, 30, 60, 120];
const DEFAULT_WORD_CONFIGS: &[u32] = &[10, 25, 50, 100];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Mode targets a deployment accepts on its leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedConfigs {
    pub time: Vec<u32>,
    pub words: Vec<u32>,
}

impl AllowedConfigs {
    pub fn for_mode(&self, mode: Mode) -> &[u32] {
        match mode {
            Mode::Time => &self.time,
            Mode::Words => &self.words,
        }
    }

    pub fn contains(&self, config: TestConfig) -> bool {
        self.for_mode(config.mode).contains(&config.target)
    }
}

impl Default for AllowedConfigs {
    fn default() -> Self {
        Self {
            time: DEFAULT_TIME_CONFIGS.to_vec(),
            words: DEFAULT_WORD_CONFIGS.to_vec(),
        }
    }
}

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Postgres connection string; the in-memory store is used when unset
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_expiration_days: i64,
    /// Captcha is not enforced when unset
    pub recaptcha_secret: Option<String>,
    pub recaptcha_site_key: Option<String>,
    pub allowed: AllowedConfigs,
    pub pending_score_ttl: Duration,
    pub cleanup_interval: Duration,
    pub words_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            jwt_secret: "your-secret-key-change-in-production".to_string(),
            session_expiration_days: 7,
            recaptcha_secret: None,
            recaptcha_site_key: None,
            allowed: AllowedConfigs::default(),
            pending_score_ttl: Duration::from_secs(60 * 60),
            cleanup_interval: Duration::from_secs(5 * 60),
            words_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let allowed = AllowedConfigs {
            time: match get("TIME_CONFIGS") {
                Some(v) => parse_list("TIME_CONFIGS", &v)?,
                None => defaults.allowed.time,
            },
            words: match get("WORD_CONFIGS") {
                Some(v) => parse_list("WORD_CONFIGS", &v)?,
                None => defaults.allowed.words,
            },
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: get("DATABASE_URL"),
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_expiration_days: match get("SESSION_EXPIRATION_DAYS") {
                Some(v) => parse_num("SESSION_EXPIRATION_DAYS", &v)?,
                None => defaults.session_expiration_days,
            },
            recaptcha_secret: get("RECAPTCHA_SECRET"),
            recaptcha_site_key: get("RECAPTCHA_SITE_KEY"),
            allowed,
            pending_score_ttl: match get("PENDING_SCORE_TTL_SECS") {
                Some(v) => parse_secs("PENDING_SCORE_TTL_SECS", &v)?,
                None => defaults.pending_score_ttl,
            },
            cleanup_interval: match get("CLEANUP_INTERVAL_SECS") {
                Some(v) => parse_secs("CLEANUP_INTERVAL_SECS", &v)?,
                None => defaults.cleanup_interval,
            },
            words_file: get("WORDS_FILE").map(PathBuf::from),
        })
    }
}

fn parse_num<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

/// Positive whole seconds; a zero period or lifetime is rejected.
fn parse_secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match parse_num::<u64>(key, value)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_list(key: &'static str, value: &str) -> Result<Vec<u32>, ConfigError> {
    let invalid = || ConfigError::Invalid {
        key,
        value: value.to_string(),
    };

    let list = value
        .split(',')
        .map(|item| item.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    if list.is_empty() || list.contains(&0) {
        return Err(invalid());
    }
    Ok(list)
}
