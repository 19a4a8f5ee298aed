//! Handlers for blog posts.
//!
//! Public reads are open; writes and the unrestricted listing require an
//! admin token.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use boganto_core::types::DbId;
use boganto_db::models::post::PostKey;

use crate::error::AppResult;
use crate::middleware::rbac::{MaybeAdmin, RequireAdmin};
use crate::payload::PostPayload;
use crate::publishing;
use crate::query::PostListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /posts
///
/// Published posts only, whatever `status` is requested.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> AppResult<impl IntoResponse> {
    let page = publishing::list_posts(&state, params, false).await?;
    Ok(Json(page))
}

/// GET /admin/posts
///
/// Every status by default; `?status=` narrows it, `all` clears it.
pub async fn list_posts_admin(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<PostListParams>,
) -> AppResult<impl IntoResponse> {
    let page = publishing::list_posts(&state, params, true).await?;
    Ok(Json(page))
}

/// GET /posts/{id}
pub async fn get_post(
    viewer: MaybeAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let post = publishing::fetch_post(&state, PostKey::Id(id), viewer.is_admin()).await?;
    Ok(Json(DataResponse { data: post }))
}

/// GET /posts/slug/{slug}
pub async fn get_post_by_slug(
    viewer: MaybeAdmin,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<impl IntoResponse> {
    let post = publishing::fetch_post(&state, PostKey::Slug(slug), viewer.is_admin()).await?;
    Ok(Json(DataResponse { data: post }))
}

/// POST /admin/posts
///
/// Accepts `multipart/form-data` (with optional images) or JSON.
pub async fn create_post(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    payload: PostPayload,
) -> AppResult<impl IntoResponse> {
    let outcome = publishing::create_post(&state, payload.into_submission()?).await?;
    tracing::debug!(user_id = admin.user_id, post_id = outcome.id, "Create post handled");
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// PUT /admin/posts/{id}
pub async fn update_post(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    payload: PostPayload,
) -> AppResult<impl IntoResponse> {
    let outcome = publishing::update_post(&state, id, payload.into_submission()?).await?;
    tracing::debug!(user_id = admin.user_id, post_id = id, "Update post handled");
    Ok(Json(DataResponse { data: outcome }))
}

/// DELETE /admin/posts/{id}
pub async fn delete_post(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    publishing::delete_post(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
