//! Profile picture collaborator

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::validation::PictureUpload;

/// Turns an uploaded picture into a stored thumbnail
///
/// Returns the filename to record in `User::image_file`. Undecodable uploads
/// are reported as a `Validation` error on the `picture` field.
#[async_trait]
pub trait PictureStore: Send + Sync {
    async fn store(&self, upload: &PictureUpload) -> AuthResult<String>;

    /// Remove a stored picture that ended up unused
    async fn discard(&self, filename: &str) -> AuthResult<()>;
}
