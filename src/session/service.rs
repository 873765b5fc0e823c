use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    generators::{IdGenerator, NameGenerator, PetNameGenerator, UuidGenerator},
    token::TokenConfig,
    types::{SessionClaims, SessionResponse},
};
use crate::shared::AppError;

/// Issues and validates the signed session identity that pending scores are
/// keyed by. Sessions are stateless: the token is the capability.
pub struct SessionService {
    token_config: TokenConfig,
    ids: Arc<dyn IdGenerator>,
    names: Arc<dyn NameGenerator>,
}

impl SessionService {
    pub fn new(token_config: TokenConfig) -> Self {
        Self::with_generators(
            token_config,
            Arc::new(UuidGenerator),
            Arc::new(PetNameGenerator),
        )
    }

    pub fn with_generators(
        token_config: TokenConfig,
        ids: Arc<dyn IdGenerator>,
        names: Arc<dyn NameGenerator>,
    ) -> Self {
        Self {
            token_config,
            ids,
            names,
        }
    }

    pub fn expiration_days(&self) -> i64 {
        self.token_config.expiration_days
    }

    /// Creates a new session id and signs it
    #[instrument(skip(self))]
    pub async fn create_session(&self) -> Result<SessionResponse, AppError> {
        let session_id = self.ids.generate();
        let token = self.token_config.create_token(session_id.clone())?;
        let suggested_name = self.names.generate();

        info!(session_id = %session_id, "Session created");

        Ok(SessionResponse {
            session_id: token,
            suggested_name,
        })
    }

    /// Validates a session token and returns the claims if valid
    #[instrument(skip(self, token))]
    pub async fn validate_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        match self.token_config.validate_token(token) {
            Ok(claims) => Ok(claims),
            Err(e) => {
                warn!(error = %e, "Session token rejected");
                Err(AppError::Unauthorized(
                    "Session is invalid or has expired".to_string(),
                ))
            }
        }
    }
}
