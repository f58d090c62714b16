//! User repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use common::error::unique_violation;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserStore;

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AuthResult<Option<User>> {
        let sql = format!(
            r#"
            SELECT id, username, email, password_hash, image_file, created_at, updated_at
            FROM users
            WHERE {} = $1
            "#,
            column
        );

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        image_file: row.get("image_file"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Translate a unique-constraint violation into the matching domain error
fn map_write_error(err: sqlx::Error) -> AuthError {
    match unique_violation(&err) {
        Some("users_username_key") => AuthError::DuplicateUsername,
        Some("users_email_key") => AuthError::DuplicateEmail,
        _ => AuthError::Database(err),
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert(&self, new_user: &NewUser) -> AuthResult<User> {
        info!("Creating new user: {}", new_user.username);

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, image_file)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, image_file, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.image_file)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user_from_row(&row))
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>> {
        info!("Finding user by ID: {}", id);

        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, image_file, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        info!("Finding user by email: {}", email);
        self.find_one("email", email).await
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        info!("Finding user by username: {}", username);
        self.find_one("username", username).await
    }

    async fn update_profile(&self, id: Uuid, update: &UpdateUser) -> AuthResult<User> {
        info!("Updating profile of user: {}", id);

        let row = sqlx::query(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                image_file = COALESCE($4, image_file),
                updated_at = $5
            WHERE id = $1
            RETURNING id, username, email, password_hash, image_file, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&update.username)
        .bind(&update.email)
        .bind(update.image_file.as_deref())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.as_ref()
            .map(user_from_row)
            .ok_or(AuthError::UserNotFound)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AuthResult<()> {
        info!("Updating password of user: {}", id);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}
