//! Blog models for request and response payloads

pub mod post;

pub use post::{NewPost, Post, PostDraft, PostForm, PostView};
