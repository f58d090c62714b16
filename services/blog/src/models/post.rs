//! Post model and forms

use auth::UserProfile;
use auth::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Post entity; `author_id` and `date_posted` never change after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub author_id: Uuid,
}

/// Row to insert
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
}

impl NewPost {
    /// A post by `author_id`, stamped with the current time
    pub fn now(author_id: Uuid, draft: PostDraft) -> Self {
        Self {
            author_id,
            title: draft.title,
            content: draft.content,
            date_posted: Utc::now(),
        }
    }
}

/// Post form as submitted
#[derive(Debug, Clone, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Validated title and content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

impl PostForm {
    pub fn validate(self) -> Result<PostDraft, ValidationErrors> {
        let title = self.title.trim().to_string();

        let mut errors = ValidationErrors::new();
        if title.is_empty() {
            errors.add("title", "Title is required");
        } else if title.chars().count() > 100 {
            errors.add("title", "Title must be at most 100 characters long");
        }
        if self.content.trim().is_empty() {
            errors.add("content", "Content is required");
        }

        if errors.is_empty() {
            Ok(PostDraft {
                title,
                content: self.content,
            })
        } else {
            Err(errors)
        }
    }
}

/// A post together with its author, as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub date_posted: DateTime<Utc>,
    pub author: Option<UserProfile>,
}

impl PostView {
    pub fn new(post: Post, author: Option<UserProfile>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            date_posted: post.date_posted,
            author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_requires_title_and_content() {
        let errors = PostForm {
            title: "   ".to_string(),
            content: String::new(),
        }
        .validate()
        .unwrap_err();

        assert!(errors.has_field("title"));
        assert!(errors.has_field("content"));
    }

    #[test]
    fn post_form_limits_title_length() {
        let errors = PostForm {
            title: "t".repeat(101),
            content: "body".to_string(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.has_field("title"));

        let draft = PostForm {
            title: " First post ".to_string(),
            content: "body".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(draft.title, "First post");
    }
}
