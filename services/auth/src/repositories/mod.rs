//! User persistence
//!
//! `UserStore` is the seam between the credential store and the backing
//! database. PostgreSQL is the production backend; the in-memory one in
//! [`crate::memory`] serves local runs and tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AuthResult;
use crate::models::{NewUser, UpdateUser, User};

pub mod user;

pub use user::UserRepository;

/// Storage operations over user records
///
/// Lookups by username and email are exact, case-sensitive matches.
/// Implementations report a clash on either unique column as
/// `DuplicateUsername` / `DuplicateEmail`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, new_user: &NewUser) -> AuthResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> AuthResult<User>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AuthResult<()>;
}
