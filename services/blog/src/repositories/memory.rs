//! In-memory post storage

use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{NewPost, Post, PostDraft};
use crate::repositories::PostStore;

/// Posts in a shared vector
#[derive(Debug, Clone, Default)]
pub struct InMemoryPostStore {
    posts: Arc<Mutex<Vec<Post>>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, new_post: &NewPost) -> Result<Post> {
        let post = Post {
            id: Uuid::new_v4(),
            title: new_post.title.clone(),
            content: new_post.content.clone(),
            date_posted: new_post.date_posted,
            author_id: new_post.author_id,
        };
        self.posts.lock().await.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let posts = self.posts.lock().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn update(&self, id: Uuid, draft: &PostDraft) -> Result<Option<Post>> {
        let mut posts = self.posts.lock().await;
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = draft.title.clone();
        post.content = draft.content.clone();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut posts = self.posts.lock().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }

    async fn page(
        &self,
        author_id: Option<Uuid>,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<Post>, u64)> {
        let posts = self.posts.lock().await;

        let mut matching: Vec<&Post> = posts
            .iter()
            .filter(|p| author_id.is_none_or(|id| p.author_id == id))
            .collect();
        matching.sort_by_key(|p| Reverse((p.date_posted, p.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(offset.min(usize::MAX as u64) as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }
}
