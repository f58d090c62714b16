//! Error types for the authentication library

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Outcome of an authentication operation that did not succeed
///
/// Everything except `Database` and `Internal` is an expected domain
/// condition the user can act on.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("That username is taken. Please choose a different one.")]
    DuplicateUsername,

    #[error("That email is taken. Please choose a different one.")]
    DuplicateEmail,

    /// Unknown email and wrong password are reported the same way
    #[error("Login unsuccessful. Please check email and password.")]
    InvalidCredentials,

    #[error("That is an invalid or expired token.")]
    InvalidOrExpiredToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// True for infrastructure faults, which callers log and turn into a 500
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AuthError::Database(_) | AuthError::Internal(_))
    }
}

impl From<ValidationErrors> for AuthError {
    fn from(errors: ValidationErrors) -> Self {
        AuthError::Validation(errors)
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
