//! Account handlers: registration, login, profile and password reset

use auth::validation::{
    AccountForm, LoginForm, PictureUpload, RegistrationForm, ResetPasswordForm, ResetRequestForm,
    ValidationErrors,
};
use auth::{AuthError, UserProfile};
use axum::{
    Form, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    extract::{RequireAnonymous, RequireUser, safe_next, session_id, with_session, without_session},
    mailer::{dispatch, reset_email},
    routes::{flash, flash_with},
    state::AppState,
};

/// Create an account
pub async fn register(
    _: RequireAnonymous,
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> AppResult<impl IntoResponse> {
    let registration = form.validate()?;
    let user = state.credentials.register(&registration).await?;

    info!("User {} registered", user.id);

    Ok((
        StatusCode::CREATED,
        flash(
            "Your account has been created! You are now able to log in",
            "success",
            "/login",
        ),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Check credentials and open a session
pub async fn login(
    _: RequireAnonymous,
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    let login = form.validate()?;
    let user = state.credentials.login(&login).await?;

    let ticket = state
        .sessions
        .login(session_id(&jar).as_deref(), &user, login.remember)
        .await?;

    Ok((
        with_session(jar, &ticket),
        flash("Login successful", "success", &safe_next(query.next.as_deref())),
    ))
}

/// Close the session; works without one too
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<impl IntoResponse> {
    state.sessions.logout(session_id(&jar).as_deref()).await?;

    Ok((without_session(jar), flash("You have been logged out", "info", "/")))
}

/// Profile of the signed-in user
pub async fn account(RequireUser(user): RequireUser) -> impl IntoResponse {
    Json(UserProfile::from(&user))
}

async fn read_account_form(mut multipart: Multipart) -> AppResult<AccountForm> {
    let mut form = AccountForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => {
                form.username = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "email" => {
                form.email = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "picture" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.picture = Some(PictureUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Change username, email and optionally the profile picture
pub async fn update_account(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let update = read_account_form(multipart).await?.validate()?;
    let updated = state.credentials.update_profile(&user, &update).await?;

    Ok(flash_with(
        "Your account has been updated!",
        "success",
        "/account",
        UserProfile::from(&updated),
    ))
}

/// Mail a reset link to the account behind an email address
pub async fn reset_request(
    _: RequireAnonymous,
    State(state): State<AppState>,
    Form(form): Form<ResetRequestForm>,
) -> AppResult<impl IntoResponse> {
    let request = form.validate()?;

    let user = state
        .credentials
        .users()
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| {
            ValidationErrors::single(
                "email",
                "There is no account with that email. You must register first.",
            )
        })?;

    let token = state.reset_tokens.issue(&user)?;
    let link = state.settings.reset_link(&token);
    dispatch(state.mailer.clone(), reset_email(&user.email, &link));

    info!("Password reset requested for user {}", user.id);

    Ok(flash(
        "An email has been sent with instructions to reset your password.",
        "info",
        "/login",
    ))
}

/// Check a reset token before showing the new-password form
pub async fn reset_token(
    _: RequireAnonymous,
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .reset_tokens
        .verify(&token)
        .await?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    Ok(Json(serde_json::json!({
        "title": "Reset Password",
        "username": user.username,
    })))
}

/// Set a new password with a reset token
pub async fn reset_password(
    _: RequireAnonymous,
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<ResetPasswordForm>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .reset_tokens
        .verify(&token)
        .await?
        .ok_or(AuthError::InvalidOrExpiredToken)?;

    let password = form.validate()?;
    state.credentials.set_password(&user, &password).await?;

    Ok(flash(
        "Your password has been updated! You are now able to log in",
        "success",
        "/login",
    ))
}
