//! Route definitions for blog posts.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::posts;
use crate::state::AppState;

/// Public post routes, registered under `/posts`.
///
/// ```text
/// GET    /                 list_posts
/// GET    /{id}             get_post
/// GET    /slug/{slug}      get_post_by_slug
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts))
        .route("/{id}", get(posts::get_post))
        .route("/slug/{slug}", get(posts::get_post_by_slug))
}

/// Editorial post routes, registered under `/admin/posts`.
///
/// ```text
/// GET    /                 list_posts_admin
/// POST   /                 create_post
/// PUT    /{id}             update_post
/// DELETE /{id}             delete_post
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::list_posts_admin).post(posts::create_post))
        .route("/{id}", put(posts::update_post).delete(posts::delete_post))
}
