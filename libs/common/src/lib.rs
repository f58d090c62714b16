//! Common library for the blog workspace
//!
//! This crate provides the infrastructure shared by the auth library and the
//! blog server: PostgreSQL pooling and migrations, the Redis client used for
//! login sessions, and the infrastructure error type.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     assert!(health_check(&pool).await?);
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
