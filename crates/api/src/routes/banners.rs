//! Route definitions for hero banners.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::banners;
use crate::state::AppState;

/// Public banner routes, registered under `/banners`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(banners::list_active_banners))
}

/// Editorial banner routes, registered under `/admin/banners`.
///
/// ```text
/// GET    /                 list_banners
/// POST   /                 create_banner
/// PUT    /{id}             update_banner
/// DELETE /{id}             delete_banner
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::list_banners).post(banners::create_banner))
        .route("/{id}", put(banners::update_banner).delete(banners::delete_banner))
}
