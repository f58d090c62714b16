//! Service settings read from `BLOG_*` environment variables

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

use crate::pagination::DEFAULT_PER_PAGE;

/// Where users, posts and sessions live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL for users and posts, Redis for sessions
    Postgres,
    /// Process memory; nothing survives a restart
    Memory,
}

/// Blog service settings
///
/// # Environment Variables
/// - `BLOG_BIND_ADDRESS` (default: 0.0.0.0:5000)
/// - `BLOG_BASE_URL`: prefix of links sent by mail (default: http://localhost:5000)
/// - `BLOG_STORAGE`: `postgres` or `memory` (default: postgres)
/// - `BLOG_UPLOAD_DIR`: profile picture directory (default: static/propic)
/// - `BLOG_POSTS_PER_PAGE` (default: 5)
/// - `BLOG_MAIL_SERVER`: SMTP relay; mail is only logged when unset
/// - `BLOG_MAIL_PORT` (default: 587)
/// - `BLOG_MAIL_USERNAME`, `BLOG_MAIL_PASSWORD`
/// - `BLOG_MAIL_SENDER` (default: noreply@demo.com)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_address: String,
    pub base_url: String,
    pub storage: StorageBackend,
    pub upload_dir: String,
    pub posts_per_page: u32,
    #[serde(default)]
    pub mail_server: Option<String>,
    pub mail_port: u16,
    #[serde(default)]
    pub mail_username: Option<String>,
    #[serde(default)]
    pub mail_password: Option<String>,
    pub mail_sender: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_address", "0.0.0.0:5000")?
            .set_default("base_url", "http://localhost:5000")?
            .set_default("storage", "postgres")?
            .set_default("upload_dir", "static/propic")?
            .set_default("posts_per_page", i64::from(DEFAULT_PER_PAGE))?
            .set_default("mail_port", 587_i64)?
            .set_default("mail_sender", "noreply@demo.com")?
            .add_source(Environment::with_prefix("BLOG").try_parsing(true))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?
            .try_deserialize::<Settings>()
            .map_err(|e| anyhow::anyhow!("Invalid settings: {}", e))?;

        if settings.posts_per_page == 0 {
            anyhow::bail!("BLOG_POSTS_PER_PAGE must be positive");
        }

        Ok(Settings {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            ..settings
        })
    }

    /// Absolute link to the password reset page for `token`
    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset_password/{}", self.base_url, token)
    }
}

#[cfg(test)]
impl Settings {
    /// In-memory settings for handler tests
    pub fn for_tests() -> Self {
        Settings {
            bind_address: "127.0.0.1:0".to_string(),
            base_url: "http://localhost:5000".to_string(),
            storage: StorageBackend::Memory,
            upload_dir: std::env::temp_dir()
                .join("blog-test-propic")
                .to_string_lossy()
                .into_owned(),
            posts_per_page: DEFAULT_PER_PAGE,
            mail_server: None,
            mail_port: 587,
            mail_username: None,
            mail_password: None,
            mail_sender: "noreply@demo.com".to_string(),
        }
    }
}
