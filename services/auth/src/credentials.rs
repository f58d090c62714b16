//! Credential store: registration, login checks and profile changes

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AuthError, AuthResult};
use crate::models::{DEFAULT_IMAGE_FILE, NewUser, UpdateUser, User};
use crate::password::PasswordHasher;
use crate::picture::PictureStore;
use crate::repositories::UserStore;
use crate::validation::{Login, NewPassword, ProfileUpdate, Registration};

/// Owns user records and everything that touches their passwords
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    pictures: Arc<dyn PictureStore>,
    hasher: PasswordHasher,
}

impl CredentialStore {
    pub fn new(
        users: Arc<dyn UserStore>,
        pictures: Arc<dyn PictureStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            pictures,
            hasher,
        }
    }

    /// Underlying user storage, for plain lookups
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Create an account; usernames and emails must be unused (exact match)
    pub async fn register(&self, registration: &Registration) -> AuthResult<User> {
        info!("Registering user: {}", registration.username);

        if self
            .users
            .find_by_username(&registration.username)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateUsername);
        }

        if self
            .users
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(&registration.password)?;

        self.users
            .insert(&NewUser {
                username: registration.username.clone(),
                email: registration.email.clone(),
                password_hash,
                image_file: DEFAULT_IMAGE_FILE.to_string(),
            })
            .await
    }

    /// Return the user only if the email exists and the password verifies
    ///
    /// `None` does not say which of the two checks failed.
    pub async fn authenticate(&self, login: &Login) -> AuthResult<Option<User>> {
        info!("Login attempt for email: {}", login.email);

        let Some(user) = self.users.find_by_email(&login.email).await? else {
            return Ok(None);
        };

        if self.hasher.verify(&login.password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Like [`authenticate`](Self::authenticate), with the miss reported as
    /// `InvalidCredentials`
    pub async fn login(&self, login: &Login) -> AuthResult<User> {
        self.authenticate(login)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Replace the stored password hash
    pub async fn set_password(&self, user: &User, password: &NewPassword) -> AuthResult<()> {
        info!("Setting new password for user: {}", user.id);

        let password_hash = self.hasher.hash(&password.0)?;
        self.users.update_password(user.id, &password_hash).await
    }

    /// Change username/email and optionally the picture
    ///
    /// Keeping one's own username or email is never a conflict.
    pub async fn update_profile(&self, user: &User, update: &ProfileUpdate) -> AuthResult<User> {
        info!("Updating account of user: {}", user.id);

        if update.username != user.username
            && self
                .users
                .find_by_username(&update.username)
                .await?
                .is_some()
        {
            return Err(AuthError::DuplicateUsername);
        }

        if update.email != user.email && self.users.find_by_email(&update.email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let image_file = match &update.picture {
            Some(upload) => Some(self.pictures.store(upload).await?),
            None => None,
        };

        let result = self
            .users
            .update_profile(
                user.id,
                &UpdateUser {
                    username: update.username.clone(),
                    email: update.email.clone(),
                    image_file: image_file.clone(),
                },
            )
            .await;

        if let (Err(_), Some(filename)) = (&result, &image_file) {
            // nobody points at the new picture
            if let Err(e) = self.pictures.discard(filename).await {
                warn!("Failed to discard picture {}: {}", filename, e);
            }
        }

        result
    }
}
