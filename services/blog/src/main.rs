use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod avatar;
mod error;
mod extract;
mod guard;
mod listing;
mod mailer;
mod models;
mod pagination;
mod posts;
mod repositories;
mod routes;
mod settings;
mod state;

use auth::memory::{InMemorySessionStore, InMemoryUserStore};
use auth::{
    AuthConfig, CredentialStore, PasswordHasher, RedisSessionStore, ResetTokenService,
    SessionAuthority, SessionStore, UserRepository, UserStore,
};
use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{
    avatar::ThumbnailStore,
    repositories::{InMemoryPostStore, PostRepository, PostStore},
    settings::{Settings, StorageBackend},
    state::AppState,
};

type Stores = (Arc<dyn UserStore>, Arc<dyn SessionStore>, Arc<dyn PostStore>);

async fn postgres_stores() -> Result<Stores> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let redis = RedisPool::new(&RedisConfig::from_env()?).await?;
    if !redis.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    Ok((
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(RedisSessionStore::new(redis)),
        Arc::new(PostRepository::new(pool)),
    ))
}

fn memory_stores() -> Stores {
    info!("Using in-memory storage; data is lost on restart");
    (
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(InMemoryPostStore::new()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting blog service");

    let settings = Settings::from_env()?;
    let auth_config = AuthConfig::from_env()?;

    let (users, sessions, posts) = match settings.storage {
        StorageBackend::Postgres => postgres_stores().await?,
        StorageBackend::Memory => memory_stores(),
    };

    let pictures = Arc::new(ThumbnailStore::new(&settings.upload_dir));
    let mailer = mailer::from_settings(&settings)?;

    let app_state = AppState {
        credentials: CredentialStore::new(users.clone(), pictures, PasswordHasher::new()),
        sessions: SessionAuthority::new(sessions, users.clone(), &auth_config),
        reset_tokens: ResetTokenService::new(&auth_config, users),
        posts,
        mailer,
        settings: Arc::new(settings.clone()),
    };

    info!("Blog service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&settings.bind_address).await?;
    info!("Blog service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
