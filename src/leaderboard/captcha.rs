use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::shared::AppError;

pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Confirms that a claim came from a human
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// False in open mode, where claims need no token
    fn is_enforced(&self) -> bool;

    /// `Ok(false)` means the provider rejected the token; `Err` means the
    /// provider could not be reached.
    async fn verify(&self, token: &str) -> Result<bool, AppError>;
}

/// Open mode: used when no captcha secret is configured
#[derive(Debug, Default)]
pub struct DisabledCaptcha;

#[async_trait]
impl CaptchaVerifier for DisabledCaptcha {
    fn is_enforced(&self) -> bool {
        false
    }

    async fn verify(&self, _token: &str) -> Result<bool, AppError> {
        Ok(true)
    }
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Google reCAPTCHA server-side verification
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
    verify_url: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: String) -> Result<Self, AppError> {
        Self::with_url(secret, RECAPTCHA_VERIFY_URL.to_string())
    }

    pub fn with_url(secret: String, verify_url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            secret,
            verify_url,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    fn is_enforced(&self) -> bool {
        true
    }

    #[instrument(skip(self, token))]
    async fn verify(&self, token: &str) -> Result<bool, AppError> {
        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "Captcha provider unreachable");
                AppError::Upstream(format!("captcha verification: {e}"))
            })?;

        let body: SiteVerifyResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Captcha provider returned malformed response");
            AppError::Upstream(format!("captcha verification: {e}"))
        })?;

        debug!(
            success = body.success,
            error_codes = ?body.error_codes,
            "Captcha verification completed"
        );
        Ok(body.success)
    }
}
