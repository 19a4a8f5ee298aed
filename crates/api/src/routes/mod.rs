pub mod banners;
pub mod categories;
pub mod health;
pub mod posts;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /posts                       public post reads
/// /categories                  category listing
/// /banners                     active hero banners
/// /admin/posts                 post editing (admin token)
/// /admin/banners               banner editing (admin token)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/posts", posts::router())
        .nest("/categories", categories::router())
        .nest("/banners", banners::router())
        .nest("/admin/posts", posts::admin_router())
        .nest("/admin/banners", banners::admin_router())
}
