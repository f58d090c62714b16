//! Profile picture thumbnails

use async_trait::async_trait;
use auth::validation::{PictureUpload, ValidationErrors};
use auth::{AuthError, AuthResult, PictureStore};
use image::ImageFormat;
use rand::RngCore;
use std::path::{Path, PathBuf};
use tracing::info;

/// Edge length of the square box thumbnails are fitted into
pub const THUMBNAIL_SIZE: u32 = 125;

/// Stores 125x125 thumbnails under random names in a directory
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    upload_dir: PathBuf,
}

impl ThumbnailStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    fn random_filename(extension: &str) -> String {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("{}.{}", hex::encode(bytes), extension)
    }
}

enum ThumbnailError {
    Decode(image::ImageError),
    Write(image::ImageError),
}

fn write_thumbnail(bytes: &[u8], path: &Path, format: ImageFormat) -> Result<(), ThumbnailError> {
    let img = image::load_from_memory(bytes).map_err(ThumbnailError::Decode)?;
    let thumb = img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);

    let thumb = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => image::DynamicImage::ImageRgb8(thumb.to_rgb8()),
        _ => thumb,
    };

    thumb
        .save_with_format(path, format)
        .map_err(ThumbnailError::Write)
}

#[async_trait]
impl PictureStore for ThumbnailStore {
    async fn store(&self, upload: &PictureUpload) -> AuthResult<String> {
        let (extension, format) = match upload
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => ("png", ImageFormat::Png),
            Some("jpg") => ("jpg", ImageFormat::Jpeg),
            _ => {
                return Err(AuthError::Validation(ValidationErrors::single(
                    "picture",
                    "Only jpg and png images are allowed",
                )));
            }
        };

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {}", e))?;

        let filename = Self::random_filename(extension);
        let path = self.upload_dir.join(&filename);
        let bytes = upload.bytes.clone();

        let outcome = tokio::task::spawn_blocking(move || write_thumbnail(&bytes, &path, format))
            .await
            .map_err(|e| anyhow::anyhow!("Thumbnail task failed: {}", e))?;

        match outcome {
            Ok(()) => {
                info!("Stored profile picture {}", filename);
                Ok(filename)
            }
            Err(ThumbnailError::Decode(e)) => {
                info!("Rejected profile picture: {}", e);
                Err(AuthError::Validation(ValidationErrors::single(
                    "picture",
                    "The uploaded file is not a valid image",
                )))
            }
            Err(ThumbnailError::Write(e)) => {
                Err(anyhow::anyhow!("Failed to save thumbnail: {}", e).into())
            }
        }
    }

    async fn discard(&self, filename: &str) -> AuthResult<()> {
        match tokio::fs::remove_file(self.upload_dir.join(filename)).await {
            Ok(()) => {
                info!("Discarded profile picture {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::anyhow!("Failed to remove {}: {}", filename, e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("blog-avatar-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn stores_thumbnail_under_random_name() {
        let dir = temp_dir();
        let store = ThumbnailStore::new(&dir);

        let filename = store
            .store(&PictureUpload {
                filename: "me.PNG".to_string(),
                bytes: png_bytes(300, 200),
            })
            .await
            .unwrap();

        assert!(filename.ends_with(".png"));
        assert_eq!(filename.len(), 16 + ".png".len());

        let saved = image::open(dir.join(&filename)).unwrap();
        let (width, height) = saved.dimensions();
        assert_eq!(width, THUMBNAIL_SIZE);
        assert!(height < THUMBNAIL_SIZE);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn jpeg_upload_is_saved_as_jpeg() {
        let dir = temp_dir();
        let store = ThumbnailStore::new(&dir);

        let filename = store
            .store(&PictureUpload {
                filename: "me.jpg".to_string(),
                bytes: png_bytes(50, 50),
            })
            .await
            .unwrap();

        let saved = std::fs::read(dir.join(&filename)).unwrap();
        assert_eq!(image::guess_format(&saved).unwrap(), ImageFormat::Jpeg);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn discard_removes_the_file() {
        let dir = temp_dir();
        let store = ThumbnailStore::new(&dir);

        let filename = store
            .store(&PictureUpload {
                filename: "me.png".to_string(),
                bytes: png_bytes(40, 40),
            })
            .await
            .unwrap();
        assert!(dir.join(&filename).exists());

        store.discard(&filename).await.unwrap();
        assert!(!dir.join(&filename).exists());

        // already gone
        store.discard(&filename).await.unwrap();

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn garbage_is_a_validation_error() {
        let dir = temp_dir();
        let store = ThumbnailStore::new(&dir);

        let result = store
            .store(&PictureUpload {
                filename: "me.png".to_string(),
                bytes: b"definitely not a png".to_vec(),
            })
            .await;

        match result {
            Err(AuthError::Validation(errors)) => assert!(errors.has_field("picture")),
            other => panic!("unexpected result: {:?}", other),
        }

        let _ = std::fs::remove_dir_all(dir);
    }
}
