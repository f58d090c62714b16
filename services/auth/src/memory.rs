//! In-memory backends for users and sessions
//!
//! Used when the server runs without PostgreSQL/Redis and by tests. They
//! follow the same contracts as the persistent backends, including the
//! case-sensitive uniqueness of usernames and emails.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserStore;
use crate::session::SessionStore;

/// User records in a shared map
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user outright; there is no account deletion flow, this is for
    /// exercising dangling references
    pub async fn remove(&self, id: Uuid) -> Option<User> {
        self.users.lock().await.remove(&id)
    }

    fn check_unique(
        users: &HashMap<Uuid, User>,
        username: &str,
        email: &str,
        except: Option<Uuid>,
    ) -> AuthResult<()> {
        let others = users.values().filter(|u| Some(u.id) != except);
        for user in others {
            if user.username == username {
                return Err(AuthError::DuplicateUsername);
            }
            if user.email == email {
                return Err(AuthError::DuplicateEmail);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, new_user: &NewUser) -> AuthResult<User> {
        let mut users = self.users.lock().await;
        Self::check_unique(&users, &new_user.username, &new_user.email, None)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            image_file: new_user.image_file.clone(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> AuthResult<User> {
        let mut users = self.users.lock().await;
        Self::check_unique(&users, &update.username, &update.email, Some(id))?;

        let user = users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        user.username = update.username.clone();
        user.email = update.email.clone();
        if let Some(image_file) = &update.image_file {
            user.image_file = image_file.clone();
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AuthResult<()> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: Uuid,
    expires: Instant,
}

/// Longest lifetime a record is kept for, whatever the requested TTL (100 years)
const MAX_SESSION_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Session records; expired ones are dropped on lookup and on every write
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included until the next write
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, session_id: &str, user_id: Uuid, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let entry = SessionEntry {
            user_id,
            expires: now + ttl.min(MAX_SESSION_TTL),
        };

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| now < entry.expires);
        entries.insert(session_id.to_string(), entry);
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<Uuid>> {
        let mut entries = self.entries.lock().await;

        match entries.get(session_id) {
            Some(entry) if Instant::now() < entry.expires => Ok(Some(entry.user_id)),
            Some(_) => {
                entries.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, session_id: &str) -> Result<()> {
        self.entries.lock().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_IMAGE_FILE;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            image_file: DEFAULT_IMAGE_FILE.to_string(),
        }
    }

    #[test]
    fn lookups_are_case_sensitive() {
        tokio_test::block_on(async {
            let store = InMemoryUserStore::new();
            store
                .insert(&new_user("Corey", "corey@example.com"))
                .await
                .unwrap();

            assert!(store.find_by_username("Corey").await.unwrap().is_some());
            assert!(store.find_by_username("corey").await.unwrap().is_none());
            assert!(store
                .find_by_email("COREY@example.com")
                .await
                .unwrap()
                .is_none());
        });
    }

    #[tokio::test]
    async fn huge_ttl_is_capped() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();

        store.put("forever", user_id, Duration::MAX).await.unwrap();

        assert_eq!(store.get("forever").await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn writes_prune_expired_sessions() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();

        store.put("stale-1", user_id, Duration::ZERO).await.unwrap();
        store.put("stale-2", user_id, Duration::ZERO).await.unwrap();
        store
            .put("live", user_id, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("live").await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn update_keeps_picture_when_none_given() {
        let store = InMemoryUserStore::new();
        let user = store
            .insert(&new_user("corey", "corey@example.com"))
            .await
            .unwrap();

        let updated = store
            .update_profile(
                user.id,
                &UpdateUser {
                    username: "corey2".to_string(),
                    email: "corey@example.com".to_string(),
                    image_file: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.username, "corey2");
        assert_eq!(updated.image_file, DEFAULT_IMAGE_FILE);
    }

    #[tokio::test]
    async fn update_rejects_values_of_other_users() {
        let store = InMemoryUserStore::new();
        store
            .insert(&new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = store
            .insert(&new_user("bob", "bob@example.com"))
            .await
            .unwrap();

        let result = store
            .update_profile(
                bob.id,
                &UpdateUser {
                    username: "bob".to_string(),
                    email: "alice@example.com".to_string(),
                    image_file: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn session_remove_is_idempotent() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();

        store
            .put("abc", user_id, Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("abc").await.unwrap(), Some(user_id));

        store.remove("abc").await.unwrap();
        store.remove("abc").await.unwrap();
        assert!(store.is_empty().await);
    }
}
