//! Post persistence

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewPost, Post, PostDraft};

pub mod memory;
pub mod post;

pub use memory::InMemoryPostStore;
pub use post::PostRepository;

/// Storage operations over posts
///
/// Writes are single-row and unconditional: the last update wins and a
/// delete removes the row for good.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, new_post: &NewPost) -> Result<Post>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// Overwrite title and content; `None` when the post no longer exists
    async fn update(&self, id: Uuid, draft: &PostDraft) -> Result<Option<Post>>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// One slice of posts, newest first (`date_posted DESC, id DESC`),
    /// optionally restricted to one author, plus the total matching count
    async fn page(&self, author_id: Option<Uuid>, limit: u32, offset: u64)
    -> Result<(Vec<Post>, u64)>;
}
