//! Authentication for the blog
//!
//! Accounts and passwords ([`credentials::CredentialStore`]), login sessions
//! ([`session::SessionAuthority`]), password reset tokens
//! ([`reset_token::ResetTokenService`]) and the typed forms that feed them
//! ([`validation`]).

pub mod config;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod memory;
pub mod models;
pub mod password;
pub mod picture;
pub mod repositories;
pub mod reset_token;
pub mod session;
pub mod validation;

pub use config::AuthConfig;
pub use credentials::CredentialStore;
pub use error::{AuthError, AuthResult};
pub use identity::Identity;
pub use models::{User, UserProfile};
pub use password::PasswordHasher;
pub use picture::PictureStore;
pub use repositories::{UserRepository, UserStore};
pub use reset_token::ResetTokenService;
pub use session::{RedisSessionStore, SessionAuthority, SessionStore, SessionTicket};
