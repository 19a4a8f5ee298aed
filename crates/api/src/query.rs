//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Query parameters for post listings.
///
/// `category` is a category slug. `featured` accepts `1`/`true`/`yes`/`on`.
/// `status` is honoured for admin callers only; `all` disables it.
#[derive(Debug, Default, Deserialize)]
pub struct PostListParams {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
