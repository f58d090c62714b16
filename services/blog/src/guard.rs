//! Ownership checks for post mutations

use auth::User;

use crate::error::AppError;
use crate::models::Post;

/// Only the author of a post may edit or delete it
pub fn authorize_mutation(post: &Post, actor: &User) -> Result<(), AppError> {
    if post.author_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
