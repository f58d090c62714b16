//! Paginated post listings, global or per author

use auth::{UserProfile, UserStore};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Post, PostView};
use crate::pagination::{Page, PageRequest};
use crate::repositories::PostStore;

/// Newest posts first; ties on `date_posted` are broken by id, descending.
/// A page past the end is empty, not an error.
pub async fn list_posts(
    store: &dyn PostStore,
    request: PageRequest,
    author_id: Option<Uuid>,
) -> AppResult<Page<Post>> {
    let (items, total) = store
        .page(author_id, request.limit(), request.offset())
        .await?;

    Ok(Page::new(items, request, total))
}

/// Attach author profiles to a page of posts
pub async fn with_authors(users: &dyn UserStore, page: Page<Post>) -> AppResult<Page<PostView>> {
    let mut authors: HashMap<Uuid, Option<UserProfile>> = HashMap::new();
    for post in &page.items {
        if !authors.contains_key(&post.author_id) {
            let author = users.find_by_id(post.author_id).await?;
            authors.insert(post.author_id, author.as_ref().map(UserProfile::from));
        }
    }

    Ok(page.map(|post| {
        let author = authors.get(&post.author_id).cloned().flatten();
        PostView::new(post, author)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPost;
    use crate::repositories::InMemoryPostStore;
    use chrono::{Duration, TimeZone, Utc};

    async fn seed(store: &InMemoryPostStore, author_id: Uuid, count: i64) -> Vec<Post> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut posts = Vec::new();
        for i in 0..count {
            let post = store
                .insert(&NewPost {
                    author_id,
                    title: format!("Post {}", i),
                    content: "content".to_string(),
                    date_posted: base + Duration::minutes(i),
                })
                .await
                .unwrap();
            posts.push(post);
        }
        posts
    }

    fn titles(page: &Page<Post>) -> Vec<&str> {
        page.items.iter().map(|p| p.title.as_str()).collect()
    }

    #[tokio::test]
    async fn twelve_posts_over_three_pages() {
        let store = InMemoryPostStore::new();
        seed(&store, Uuid::new_v4(), 12).await;

        let first = list_posts(&store, PageRequest::new(1, 5), None).await.unwrap();
        assert_eq!(
            titles(&first),
            vec!["Post 11", "Post 10", "Post 9", "Post 8", "Post 7"]
        );
        assert_eq!(first.total, 12);

        let third = list_posts(&store, PageRequest::new(3, 5), None).await.unwrap();
        assert_eq!(titles(&third), vec!["Post 1", "Post 0"]);

        let fourth = list_posts(&store, PageRequest::new(4, 5), None).await.unwrap();
        assert!(fourth.is_empty());
        assert_eq!(fourth.total, 12);
    }

    #[tokio::test]
    async fn author_filter_only_returns_their_posts() {
        let store = InMemoryPostStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        seed(&store, alice, 3).await;
        seed(&store, bob, 7).await;

        let page = list_posts(&store, PageRequest::new(1, 5), Some(alice))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|p| p.author_id == alice));
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn equal_timestamps_are_ordered_by_id() {
        let store = InMemoryPostStore::new();
        let author = Uuid::new_v4();
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        for title in ["a", "b", "c"] {
            store
                .insert(&NewPost {
                    author_id: author,
                    title: title.to_string(),
                    content: "content".to_string(),
                    date_posted: when,
                })
                .await
                .unwrap();
        }

        let first = list_posts(&store, PageRequest::new(1, 5), None).await.unwrap();
        let again = list_posts(&store, PageRequest::new(1, 5), None).await.unwrap();
        let ids: Vec<Uuid> = first.items.iter().map(|p| p.id).collect();

        let mut expected = ids.clone();
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(ids, expected);
        assert_eq!(first.items, again.items);
    }
}
