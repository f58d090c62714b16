//! Request extractors for the session identity
//!
//! The session id travels in the `session` cookie. Handlers receive the
//! resolved [`Identity`] explicitly, or use [`RequireUser`] /
//! [`RequireAnonymous`] to gate a route.

use auth::{Identity, SessionTicket, User};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::AppError;
use crate::state::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Session id presented by the client, if any
pub fn session_id(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Set the cookie for a freshly established session
pub fn with_session(jar: CookieJar, ticket: &SessionTicket) -> CookieJar {
    let mut cookie = Cookie::build((SESSION_COOKIE, ticket.session_id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    if let Some(max_age) = ticket.max_age {
        let seconds = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        cookie = cookie.max_age(time::Duration::seconds(seconds));
    }

    jar.add(cookie)
}

/// Expire the session cookie
pub fn without_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Only local paths are accepted as post-login targets
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

/// Identity of whoever sent the request
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let identity = state
            .sessions
            .current_identity(session_id(&jar).as_deref())
            .await?;

        Ok(CurrentIdentity(identity))
    }
}

/// Signed-in user; anonymous requests are sent to the login page
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;

        identity
            .into_user()
            .map(RequireUser)
            .ok_or_else(|| AppError::LoginRequired {
                next: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or_else(|| parts.uri.path())
                    .to_string(),
            })
    }
}

/// Rejects signed-in users (login, registration and password reset pages)
#[derive(Debug, Clone, Copy)]
pub struct RequireAnonymous;

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAnonymous {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentIdentity(identity) = CurrentIdentity::from_request_parts(parts, state).await?;

        if identity.is_authenticated() {
            return Err(AppError::AlreadyAuthenticated);
        }

        Ok(RequireAnonymous)
    }
}
