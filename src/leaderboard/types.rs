use serde::{Deserialize, Serialize};

use crate::config::AllowedConfigs;
use crate::typing::{Mode, TestConfig, TestResult};

/// Query for GET /api/leaderboard
#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub mode: Mode,
    pub config: u32,
}

/// Body for POST /api/session-score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScoreRequest {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub mode: Mode,
    pub config: u32,
}

impl SessionScoreRequest {
    pub fn new(result: TestResult, test: TestConfig) -> Self {
        Self {
            wpm: result.wpm,
            raw_wpm: result.raw_wpm,
            accuracy: result.accuracy,
            mode: test.mode,
            config: test.target,
        }
    }

    pub fn result(&self) -> TestResult {
        TestResult {
            wpm: self.wpm,
            raw_wpm: self.raw_wpm,
            accuracy: self.accuracy,
        }
    }

    pub fn test(&self) -> TestConfig {
        TestConfig {
            mode: self.mode,
            target: self.config,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Body for POST /api/leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimScoreRequest {
    pub name: String,
    #[serde(rename = "recaptchaToken", default)]
    pub recaptcha_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimScoreResponse {
    pub id: i64,
}

/// Response for GET /api/config
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicConfigResponse {
    pub recaptcha_site_key: Option<String>,
    pub time_configs: Vec<u32>,
    pub word_configs: Vec<u32>,
}

impl PublicConfigResponse {
    pub fn new(site_key: Option<String>, allowed: &AllowedConfigs) -> Self {
        Self {
            recaptcha_site_key: site_key,
            time_configs: allowed.time.clone(),
            word_configs: allowed.words.clone(),
        }
    }
}
