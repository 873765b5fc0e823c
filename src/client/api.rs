use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::leaderboard::{
    ClaimScoreRequest, ClaimScoreResponse, PublicConfigResponse, ScoreRecord,
    SessionScoreRequest, SuccessResponse,
};
use crate::session::SessionResponse;
use crate::typing::{TestConfig, TestResult};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("No session; create one first")]
    NoSession,

    #[error("Nothing to retry")]
    NothingToRetry,
}

impl ClientError {
    /// True for failures worth retrying unchanged: transport errors and 5xx
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Status { status, .. } => status.is_server_error(),
            ClientError::NoSession | ClientError::NothingToRetry => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the leaderboard API. Holds the session token once
/// `create_session` has run and sends it as a Bearer header.
pub struct LeaderboardClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl LeaderboardClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn has_session(&self) -> bool {
        self.token().is_some()
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.token().ok_or(ClientError::NoSession)?;
        Ok(request.bearer_auth(token))
    }

    /// POST /api/session; keeps the returned token for later writes
    #[instrument(skip(self))]
    pub async fn create_session(&self) -> Result<SessionResponse, ClientError> {
        let response = self.http.post(self.url("/api/session")).send().await?;
        let session: SessionResponse = parse(response).await?;

        if let Ok(mut token) = self.token.write() {
            *token = Some(session.session_id.clone());
        }
        debug!(suggested_name = %session.suggested_name, "Session created");
        Ok(session)
    }

    /// GET /api/config
    pub async fn config(&self) -> Result<PublicConfigResponse, ClientError> {
        let response = self.http.get(self.url("/api/config")).send().await?;
        parse(response).await
    }

    /// GET /api/leaderboard
    #[instrument(skip(self))]
    pub async fn top(&self, test: TestConfig) -> Result<Vec<ScoreRecord>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/leaderboard"))
            .query(&[
                ("mode", test.mode.to_string()),
                ("config", test.target.to_string()),
            ])
            .send()
            .await?;
        parse(response).await
    }

    /// POST /api/session-score
    #[instrument(skip(self))]
    pub async fn cache_score(&self, result: TestResult, test: TestConfig) -> Result<(), ClientError> {
        let request = self
            .authorized(self.http.post(self.url("/api/session-score")))?
            .json(&SessionScoreRequest::new(result, test));

        let _: SuccessResponse = parse(request.send().await?).await?;
        Ok(())
    }

    /// POST /api/leaderboard; returns the new row id
    #[instrument(skip(self, captcha_token))]
    pub async fn claim(&self, name: &str, captcha_token: Option<&str>) -> Result<i64, ClientError> {
        let body = ClaimScoreRequest {
            name: name.to_string(),
            recaptcha_token: captcha_token.map(str::to_string),
        };
        let request = self
            .authorized(self.http.post(self.url("/api/leaderboard")))?
            .json(&body);

        let created: ClaimScoreResponse = parse(request.send().await?).await?;
        Ok(created.id)
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    warn!(status = %status, message = %message, "Request rejected");
    Err(ClientError::Status { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typing::TestConfig;

    #[tokio::test]
    async fn test_writes_require_session() {
        let client = LeaderboardClient::new("http://127.0.0.1:1").unwrap();
        assert!(!client.has_session());

        let err = client
            .cache_score(TestResult::default(), TestConfig::time(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NoSession));

        let err = client.claim("aisha", None).await.unwrap_err();
        assert!(matches!(err, ClientError::NoSession));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        let client = LeaderboardClient::new("http://127.0.0.1:1/").unwrap();
        let err = client.top(TestConfig::time(30)).await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_status_errors_classify() {
        let server = ClientError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Service temporarily unavailable".to_string(),
        };
        let rejected = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "No pending score for this session".to_string(),
        };
        assert!(server.is_transient());
        assert!(!rejected.is_transient());
        assert!(!ClientError::NoSession.is_transient());
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = LeaderboardClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.url("/api/config"), "http://localhost:3000/api/config");
    }
}
