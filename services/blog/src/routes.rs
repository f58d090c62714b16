//! Blog service routes

use axum::{
    Json, Router,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod posts;
pub mod users;

/// Create the router for the blog service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(posts::home))
        .route("/home", get(posts::home))
        .route("/about", get(about))
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", get(users::logout))
        .route("/account", get(users::account).post(users::update_account))
        .route("/user/:username", get(posts::user_posts))
        .route("/reset_password", post(users::reset_request))
        .route(
            "/reset_password/:token",
            get(users::reset_token).post(users::reset_password),
        )
        .route("/post/new", post(posts::new_post))
        .route("/post/:id", get(posts::show_post))
        .route("/post/:id/update", post(posts::update_post))
        .route("/post/:id/delete", post(posts::delete_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "blog"
    }))
}

/// About page
pub async fn about() -> impl IntoResponse {
    Json(json!({ "title": "About" }))
}

/// `?page=` as sent; parsed leniently by `PageRequest::from_query`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Flash message plus the page the client should go to next
pub fn flash(message: &str, category: &str, redirect: &str) -> Json<Value> {
    Json(json!({
        "message": message,
        "category": category,
        "redirect": redirect,
    }))
}

/// Like [`flash`], carrying the affected resource
pub fn flash_with<T: Serialize>(
    message: &str,
    category: &str,
    redirect: &str,
    data: T,
) -> Json<Value> {
    Json(json!({
        "message": message,
        "category": category,
        "redirect": redirect,
        "data": data,
    }))
}
