//! Post handlers and listings

use auth::UserProfile;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use super::{PageQuery, flash, flash_with};
use crate::{
    error::{AppError, AppResult},
    extract::{CurrentIdentity, RequireUser},
    guard::authorize_mutation,
    listing::{list_posts, with_authors},
    models::{Post, PostForm, PostView},
    pagination::PageRequest,
    posts,
    state::AppState,
};

/// Ids that do not parse are reported like missing posts
fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Post not found"))
}

async fn view(state: &AppState, post: Post) -> AppResult<PostView> {
    let author = state
        .credentials
        .users()
        .find_by_id(post.author_id)
        .await?
        .as_ref()
        .map(UserProfile::from);

    Ok(PostView::new(post, author))
}

/// Global listing, newest first
pub async fn home(
    CurrentIdentity(identity): CurrentIdentity,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let request = PageRequest::from_query(query.page.as_deref(), state.settings.posts_per_page);
    let page = list_posts(state.posts.as_ref(), request, None).await?;
    let page = with_authors(state.credentials.users().as_ref(), page).await?;

    Ok(Json(json!({
        "posts": page,
        "current_user": identity.user().map(UserProfile::from),
    })))
}

/// Posts of one author, newest first
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .credentials
        .users()
        .find_by_username(&username)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    let request = PageRequest::from_query(query.page.as_deref(), state.settings.posts_per_page);
    let page = list_posts(state.posts.as_ref(), request, Some(user.id)).await?;
    let page = with_authors(state.credentials.users().as_ref(), page).await?;

    Ok(Json(json!({
        "user": UserProfile::from(&user),
        "posts": page,
    })))
}

/// Publish a post as the signed-in user
pub async fn new_post(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> AppResult<impl IntoResponse> {
    let draft = form.validate()?;
    let post = posts::create_post(state.posts.as_ref(), &user, draft).await?;

    Ok((
        StatusCode::CREATED,
        flash_with(
            "Your post has been created!",
            "success",
            "/",
            PostView::new(post, Some(UserProfile::from(&user))),
        ),
    ))
}

/// A single post with its author
pub async fn show_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = posts::get_post(state.posts.as_ref(), parse_post_id(&id)?).await?;
    Ok(Json(view(&state, post).await?))
}

/// Edit title and content; only the author may
pub async fn update_post(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<impl IntoResponse> {
    let post = posts::get_post(state.posts.as_ref(), parse_post_id(&id)?).await?;
    authorize_mutation(&post, &user)?;

    let draft = form.validate()?;
    let updated = posts::update_post(state.posts.as_ref(), &post, &user, &draft).await?;
    let redirect = format!("/post/{}", updated.id);

    Ok(flash_with(
        "Your post has been updated!",
        "success",
        &redirect,
        view(&state, updated).await?,
    ))
}

/// Delete a post for good; only the author may
pub async fn delete_post(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = posts::get_post(state.posts.as_ref(), parse_post_id(&id)?).await?;
    posts::delete_post(state.posts.as_ref(), &post, &user).await?;

    Ok(flash("Your post has been deleted!", "success", "/"))
}
