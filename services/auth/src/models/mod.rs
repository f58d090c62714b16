//! Authentication models

pub mod user;

// Re-export for convenience
pub use user::{DEFAULT_IMAGE_FILE, NewUser, UpdateUser, User, UserProfile};
