//! Password reset tokens
//!
//! A reset token is a self-contained HS256 JWT carrying the user id and the
//! issuance time, signed with the application secret. Nothing is stored
//! server-side: expiry is the only way a token stops working, and a token
//! can be presented any number of times inside its window.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthResult;
use crate::models::User;
use crate::repositories::UserStore;

const RESET_PURPOSE: &str = "password_reset";

/// Claims of a reset token
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Keeps reset tokens apart from anything else signed with the same secret
    pub purpose: String,
}

/// Issues and verifies reset tokens
#[derive(Clone)]
pub struct ResetTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Duration,
    users: Arc<dyn UserStore>,
}

impl ResetTokenService {
    pub fn new(config: &AuthConfig, users: Arc<dyn UserStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
            expiry: config.reset_token_expiry,
            users,
        }
    }

    /// Issue a token for `user`, valid from now for the configured window
    pub fn issue(&self, user: &User) -> AuthResult<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(&self, user: &User, issued_at: DateTime<Utc>) -> AuthResult<String> {
        info!("Issuing password reset token for user: {}", user.id);

        let iat = issued_at.timestamp();
        let claims = ResetClaims {
            sub: user.id,
            iat,
            exp: iat + self.expiry.as_secs() as i64,
            purpose: RESET_PURPOSE.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign reset token: {}", e))?;
        Ok(token)
    }

    /// Check signature, expiry and purpose; return the subject's id
    ///
    /// Every failure collapses into `None`.
    pub fn decode_subject(&self, token: &str) -> Option<Uuid> {
        match decode::<ResetClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if data.claims.purpose == RESET_PURPOSE => Some(data.claims.sub),
            Ok(_) => {
                warn!("Rejected token issued for another purpose");
                None
            }
            Err(e) => {
                info!("Rejected reset token: {}", e);
                None
            }
        }
    }

    /// Resolve a token to its user if it is authentic, unexpired and the
    /// user still exists
    pub async fn verify(&self, token: &str) -> AuthResult<Option<User>> {
        match self.decode_subject(token) {
            Some(user_id) => self.users.find_by_id(user_id).await,
            None => Ok(None),
        }
    }
}
