//! Login sessions
//!
//! A session is a random id handed to the client (as a cookie) and a
//! server-side record `session:<id> -> user id` with a TTL. The authority
//! never keeps a "current user" of its own: callers pass the session id they
//! received and get an [`Identity`] back.

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthResult;
use crate::identity::Identity;
use crate::models::User;
use crate::repositories::UserStore;

/// Storage for session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create or overwrite a session record
    async fn put(&self, session_id: &str, user_id: Uuid, ttl: Duration) -> Result<()>;

    /// Look up the user bound to a live session
    async fn get(&self, session_id: &str) -> Result<Option<Uuid>>;

    /// Remove a session record; removing a missing record succeeds
    async fn remove(&self, session_id: &str) -> Result<()>;
}

/// Session records kept in Redis with a TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, session_id: &str, user_id: Uuid, ttl: Duration) -> Result<()> {
        self.redis_pool
            .set(
                &Self::key(session_id),
                &user_id.to_string(),
                Some(ttl.as_secs().max(1)),
            )
            .await
    }

    async fn get(&self, session_id: &str) -> Result<Option<Uuid>> {
        let value = self.redis_pool.get(&Self::key(session_id)).await?;

        match value {
            Some(raw) => match Uuid::parse_str(&raw) {
                Ok(id) => Ok(Some(id)),
                Err(e) => {
                    warn!("Discarding malformed session record: {}", e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        self.redis_pool.delete(&Self::key(session_id)).await
    }
}

/// What the caller must hand back to the client after a login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub session_id: String,
    /// Cookie lifetime; `None` means a browser-session cookie
    pub max_age: Option<Duration>,
}

/// Establishes, resolves and tears down authenticated sessions
#[derive(Clone)]
pub struct SessionAuthority {
    store: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    session_ttl: Duration,
    remember_duration: Duration,
}

impl SessionAuthority {
    pub fn new(store: Arc<dyn SessionStore>, users: Arc<dyn UserStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            users,
            session_ttl: config.session_ttl,
            remember_duration: config.remember_duration,
        }
    }

    /// Bind `user` to a freshly minted session
    ///
    /// A session id presented by the client is never adopted: its record is
    /// dropped and a new id is issued. Logging in twice yields two ids that
    /// resolve to the same user.
    pub async fn login(
        &self,
        current_session: Option<&str>,
        user: &User,
        remember: bool,
    ) -> AuthResult<SessionTicket> {
        info!("Creating session for user: {}", user.id);

        if let Some(previous) = current_session.filter(|id| is_well_formed(id)) {
            self.store.remove(previous).await?;
        }

        let session_id = new_session_id();

        let (ttl, max_age) = if remember {
            (self.remember_duration, Some(self.remember_duration))
        } else {
            (self.session_ttl, None)
        };

        self.store.put(&session_id, user.id, ttl).await?;

        Ok(SessionTicket {
            session_id,
            max_age,
        })
    }

    /// Clear the session; a missing or unknown session is not an error
    pub async fn logout(&self, current_session: Option<&str>) -> AuthResult<()> {
        if let Some(session_id) = current_session {
            info!("Deleting session");
            self.store.remove(session_id).await?;
        }

        Ok(())
    }

    /// Resolve the identity behind a session id
    pub async fn current_identity(&self, current_session: Option<&str>) -> AuthResult<Identity> {
        let Some(session_id) = current_session.filter(|id| is_well_formed(id)) else {
            return Ok(Identity::Anonymous);
        };

        let Some(user_id) = self.store.get(session_id).await? else {
            return Ok(Identity::Anonymous);
        };

        let user = self.users.find_by_id(user_id).await?;
        if user.is_none() {
            // the account behind the session is gone
            self.store.remove(session_id).await?;
        }

        Ok(Identity::from(user))
    }
}

const SESSION_ID_BYTES: usize = 32;

fn new_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_well_formed(session_id: &str) -> bool {
    session_id.len() == SESSION_ID_BYTES * 2 && session_id.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemorySessionStore, InMemoryUserStore};
    use crate::models::{DEFAULT_IMAGE_FILE, NewUser};

    async fn setup() -> (SessionAuthority, Arc<InMemorySessionStore>, Arc<InMemoryUserStore>, User) {
        let users = Arc::new(InMemoryUserStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let user = users
            .insert(&NewUser {
                username: "corey".to_string(),
                email: "corey@example.com".to_string(),
                password_hash: "$argon2id$placeholder".to_string(),
                image_file: DEFAULT_IMAGE_FILE.to_string(),
            })
            .await
            .unwrap();

        let config = AuthConfig::with_secret("0123456789abcdef0123456789abcdef");
        let authority = SessionAuthority::new(sessions.clone(), users.clone(), &config);
        (authority, sessions, users, user)
    }

    #[tokio::test]
    async fn login_then_resolve_identity() {
        let (authority, _, _, user) = setup().await;

        let ticket = authority.login(None, &user, false).await.unwrap();
        assert_eq!(ticket.max_age, None);

        let identity = authority
            .current_identity(Some(&ticket.session_id))
            .await
            .unwrap();
        assert_eq!(identity.user(), Some(&user));
    }

    #[tokio::test]
    async fn no_or_unknown_session_is_anonymous() {
        let (authority, _, _, _) = setup().await;

        assert_eq!(authority.current_identity(None).await.unwrap(), Identity::Anonymous);
        assert_eq!(
            authority.current_identity(Some(&"ab".repeat(32))).await.unwrap(),
            Identity::Anonymous
        );
        assert_eq!(
            authority.current_identity(Some("not-hex")).await.unwrap(),
            Identity::Anonymous
        );
    }

    #[tokio::test]
    async fn logout_clears_identity_and_is_idempotent() {
        let (authority, _, _, user) = setup().await;
        let ticket = authority.login(None, &user, false).await.unwrap();

        authority.logout(Some(&ticket.session_id)).await.unwrap();
        authority.logout(Some(&ticket.session_id)).await.unwrap();
        authority.logout(None).await.unwrap();

        let identity = authority
            .current_identity(Some(&ticket.session_id))
            .await
            .unwrap();
        assert!(!identity.is_authenticated());
    }

    #[tokio::test]
    async fn repeated_login_rotates_the_session() {
        let (authority, sessions, _, user) = setup().await;

        let first = authority.login(None, &user, false).await.unwrap();
        let second = authority
            .login(Some(&first.session_id), &user, false)
            .await
            .unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_eq!(sessions.len().await, 1);

        let identity = authority
            .current_identity(Some(&second.session_id))
            .await
            .unwrap();
        assert_eq!(identity.user(), Some(&user));
        assert_eq!(
            authority
                .current_identity(Some(&first.session_id))
                .await
                .unwrap(),
            Identity::Anonymous
        );
    }

    #[tokio::test]
    async fn planted_session_id_is_not_adopted() {
        let (authority, _, _, user) = setup().await;
        let planted = "ab".repeat(32);

        let ticket = authority.login(Some(&planted), &user, false).await.unwrap();

        assert_ne!(ticket.session_id, planted);
        assert_eq!(
            authority.current_identity(Some(&planted)).await.unwrap(),
            Identity::Anonymous
        );
    }

    #[tokio::test]
    async fn remember_extends_cookie_lifetime() {
        let (authority, _, _, user) = setup().await;

        let ticket = authority.login(None, &user, true).await.unwrap();
        assert_eq!(ticket.max_age, Some(Duration::from_secs(31536000)));
    }

    #[tokio::test]
    async fn expired_session_is_anonymous() {
        let (authority, sessions, _, user) = setup().await;
        let ticket = authority.login(None, &user, false).await.unwrap();

        sessions
            .put(&ticket.session_id, user.id, Duration::ZERO)
            .await
            .unwrap();

        let identity = authority
            .current_identity(Some(&ticket.session_id))
            .await
            .unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn session_of_deleted_user_is_dropped() {
        let (authority, sessions, users, user) = setup().await;
        let ticket = authority.login(None, &user, false).await.unwrap();

        users.remove(user.id).await;

        let identity = authority
            .current_identity(Some(&ticket.session_id))
            .await
            .unwrap();
        assert_eq!(identity, Identity::Anonymous);
        assert_eq!(sessions.len().await, 0);
    }
}
