//! Custom error types for the blog service
//!
//! Every domain condition becomes a flash-style JSON body (message,
//! category, optional redirect). Infrastructure faults are logged and
//! answered with a bare 500.

use auth::AuthError;
use auth::validation::ValidationErrors;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the blog service
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Anonymous visitor on a page that needs a login
    #[error("Please log in to access this page.")]
    LoginRequired { next: String },

    /// Signed-in user on a page meant for visitors (login, register, reset)
    #[error("Already logged in")]
    AlreadyAuthenticated,

    #[error("You are not allowed to modify this post.")]
    Forbidden,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

fn flash(
    status: StatusCode,
    message: String,
    category: &str,
    redirect: Option<String>,
) -> Response {
    let body = Json(json!({
        "error": message,
        "category": category,
        "redirect": redirect,
    }));

    (status, body).into_response()
}

fn validation_failed(errors: &ValidationErrors) -> Response {
    let body = Json(json!({
        "error": "Please correct the highlighted fields.",
        "category": "danger",
        "fields": errors,
    }));

    (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
}

/// Login page that sends the user back to `next` afterwards
fn login_redirect(next: &str) -> String {
    match serde_urlencoded::to_string(&[("next", next)]) {
        Ok(query) => format!("/login?{}", query),
        Err(_) => "/login".to_string(),
    }
}

fn internal(err: &dyn std::fmt::Display) -> Response {
    error!("Internal error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            AppError::Auth(auth) => match auth {
                AuthError::DuplicateUsername | AuthError::DuplicateEmail => {
                    flash(StatusCode::CONFLICT, message, "danger", None)
                }
                AuthError::InvalidCredentials => {
                    flash(StatusCode::UNAUTHORIZED, message, "danger", None)
                }
                AuthError::InvalidOrExpiredToken => flash(
                    StatusCode::BAD_REQUEST,
                    message,
                    "warning",
                    Some("/reset_password".to_string()),
                ),
                AuthError::UserNotFound => flash(StatusCode::NOT_FOUND, message, "warning", None),
                AuthError::Validation(errors) => validation_failed(&errors),
                AuthError::Database(e) => internal(&e),
                AuthError::Internal(e) => internal(&e),
            },
            AppError::Validation(errors) => validation_failed(&errors),
            AppError::LoginRequired { next } => flash(
                StatusCode::UNAUTHORIZED,
                message,
                "info",
                Some(login_redirect(&next)),
            ),
            AppError::AlreadyAuthenticated => Redirect::to("/").into_response(),
            AppError::Forbidden => flash(StatusCode::FORBIDDEN, message, "danger", None),
            AppError::NotFound(_) => flash(StatusCode::NOT_FOUND, message, "warning", None),
            AppError::BadRequest(_) => flash(StatusCode::BAD_REQUEST, message, "danger", None),
            AppError::Internal(e) => internal(&e),
        }
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_conditions_map_to_status_codes() {
        let cases = [
            (AppError::Auth(AuthError::DuplicateEmail), StatusCode::CONFLICT),
            (
                AppError::Auth(AuthError::InvalidCredentials),
                StatusCode::UNAUTHORIZED,
            ),
            (
                AppError::Auth(AuthError::InvalidOrExpiredToken),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::NotFound("Post not found"), StatusCode::NOT_FOUND),
            (
                AppError::LoginRequired {
                    next: "/account".to_string(),
                },
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::AlreadyAuthenticated, StatusCode::SEE_OTHER),
            (
                AppError::Validation(ValidationErrors::single("title", "Title is required")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::Internal(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn login_redirect_keeps_the_whole_target() {
        assert_eq!(login_redirect("/account"), "/login?next=%2Faccount");
        assert_eq!(
            login_redirect("/user/corey?page=3&x=1"),
            "/login?next=%2Fuser%2Fcorey%3Fpage%3D3%26x%3D1"
        );
    }
}
