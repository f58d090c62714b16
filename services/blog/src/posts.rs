//! Post lifecycle: create, read, update, delete

use auth::User;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::guard::authorize_mutation;
use crate::models::{NewPost, Post, PostDraft};
use crate::repositories::PostStore;

/// Publish a new post by `author`, dated now
pub async fn create_post(store: &dyn PostStore, author: &User, draft: PostDraft) -> AppResult<Post> {
    info!("User {} publishes a post", author.id);
    Ok(store.insert(&NewPost::now(author.id, draft)).await?)
}

/// Fetch a post or fail with `NotFound`
pub async fn get_post(store: &dyn PostStore, id: Uuid) -> AppResult<Post> {
    store
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("Post not found"))
}

/// Overwrite title and content of a post owned by `actor`
pub async fn update_post(
    store: &dyn PostStore,
    post: &Post,
    actor: &User,
    draft: &PostDraft,
) -> AppResult<Post> {
    authorize_mutation(post, actor)?;

    store
        .update(post.id, draft)
        .await?
        .ok_or(AppError::NotFound("Post not found"))
}

/// Remove a post owned by `actor`
pub async fn delete_post(store: &dyn PostStore, post: &Post, actor: &User) -> AppResult<()> {
    authorize_mutation(post, actor)?;

    if !store.delete(post.id).await? {
        return Err(AppError::NotFound("Post not found"));
    }

    info!("Post {} deleted by {}", post.id, actor.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryPostStore;
    use chrono::Utc;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            image_file: "default.jpg".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn draft(title: &str) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            content: "content".to_string(),
        }
    }

    #[tokio::test]
    async fn create_stamps_author_and_date() {
        let store = InMemoryPostStore::new();
        let author = user("alice");

        let before = Utc::now();
        let post = create_post(&store, &author, draft("Hello")).await.unwrap();

        assert_eq!(post.author_id, author.id);
        assert!(post.date_posted >= before);
        assert_eq!(get_post(&store, post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn update_keeps_author_and_date() {
        let store = InMemoryPostStore::new();
        let author = user("alice");
        let post = create_post(&store, &author, draft("Hello")).await.unwrap();

        let updated = update_post(&store, &post, &author, &draft("Edited"))
            .await
            .unwrap();

        assert_eq!(updated.title, "Edited");
        assert_eq!(updated.author_id, post.author_id);
        assert_eq!(updated.date_posted, post.date_posted);
    }

    #[tokio::test]
    async fn strangers_cannot_update_or_delete() {
        let store = InMemoryPostStore::new();
        let author = user("alice");
        let stranger = user("bob");
        let post = create_post(&store, &author, draft("Hello")).await.unwrap();

        assert!(matches!(
            update_post(&store, &post, &stranger, &draft("Mine now")).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            delete_post(&store, &post, &stranger).await,
            Err(AppError::Forbidden)
        ));
        assert_eq!(get_post(&store, post.id).await.unwrap().title, "Hello");
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let store = InMemoryPostStore::new();
        let author = user("alice");
        let post = create_post(&store, &author, draft("Hello")).await.unwrap();

        delete_post(&store, &post, &author).await.unwrap();

        assert!(matches!(
            get_post(&store, post.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_post(&store, &post, &author).await,
            Err(AppError::NotFound(_))
        ));
    }
}
