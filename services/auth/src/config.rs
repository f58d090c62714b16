//! Authentication configuration

use anyhow::Result;
use std::time::Duration;

/// Session and reset-token settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign password reset tokens
    pub secret_key: String,
    /// How long a reset token stays valid after issuance
    pub reset_token_expiry: Duration,
    /// Server-side lifetime of a session that was not "remembered"
    pub session_ttl: Duration,
    /// Lifetime of a "remember me" session and its cookie
    pub remember_duration: Duration,
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SECRET_KEY`: Signing secret for reset tokens (required)
    /// - `RESET_TOKEN_EXPIRY`: Reset token lifetime in seconds (default: 1800)
    /// - `SESSION_TTL`: Session lifetime in seconds (default: 86400)
    /// - `REMEMBER_COOKIE_DURATION`: Remembered session lifetime in seconds (default: 31536000)
    pub fn from_env() -> Result<Self> {
        let secret_key = std::env::var("SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("SECRET_KEY environment variable not set"))?;

        if secret_key.len() < 16 {
            anyhow::bail!("SECRET_KEY must be at least 16 characters long");
        }

        let reset_token_expiry = std::env::var("RESET_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "1800".to_string()) // 30 minutes
            .parse()
            .unwrap_or(1800);

        let session_ttl = std::env::var("SESSION_TTL")
            .unwrap_or_else(|_| "86400".to_string()) // 1 day
            .parse()
            .unwrap_or(86400);

        let remember_duration = std::env::var("REMEMBER_COOKIE_DURATION")
            .unwrap_or_else(|_| "31536000".to_string()) // 365 days
            .parse()
            .unwrap_or(31536000);

        Ok(AuthConfig {
            secret_key,
            reset_token_expiry: Duration::from_secs(reset_token_expiry),
            session_ttl: Duration::from_secs(session_ttl),
            remember_duration: Duration::from_secs(remember_duration),
        })
    }

    /// Configuration with the default lifetimes and the given secret
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            reset_token_expiry: Duration::from_secs(1800),
            session_ttl: Duration::from_secs(86400),
            remember_duration: Duration::from_secs(31536000),
        }
    }
}
