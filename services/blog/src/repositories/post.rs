//! Post repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewPost, Post, PostDraft};
use crate::repositories::PostStore;

/// PostgreSQL-backed post repository
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    /// Create a new post repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        date_posted: row.get("date_posted"),
        author_id: row.get("author_id"),
    }
}

#[async_trait]
impl PostStore for PostRepository {
    async fn insert(&self, new_post: &NewPost) -> Result<Post> {
        info!("Creating post for author: {}", new_post.author_id);

        let row = sqlx::query(
            r#"
            INSERT INTO posts (id, title, content, date_posted, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, content, date_posted, author_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_post.title)
        .bind(&new_post.content)
        .bind(new_post.date_posted)
        .bind(new_post.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post_from_row(&row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        info!("Finding post by ID: {}", id);

        let row = sqlx::query(
            r#"
            SELECT id, title, content, date_posted, author_id
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn update(&self, id: Uuid, draft: &PostDraft) -> Result<Option<Post>> {
        info!("Updating post: {}", id);

        let row = sqlx::query(
            r#"
            UPDATE posts
            SET title = $2, content = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, title, content, date_posted, author_id
            "#,
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.content)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting post: {}", id);

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn page(
        &self,
        author_id: Option<Uuid>,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Post>, u64)> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, date_posted, author_id
            FROM posts
            WHERE $1::uuid IS NULL OR author_id = $1
            ORDER BY date_posted DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE $1::uuid IS NULL OR author_id = $1")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        let posts = rows.iter().map(post_from_row).collect();

        Ok((posts, count as u64))
    }
}
