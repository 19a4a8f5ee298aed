//! Shared response envelope types for API handlers.
//!
//! Responses use a `{ "data": ... }` envelope. List endpoints add paging
//! fields next to `data`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: banners }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "total", "page", "limit", "total_pages" }` envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    /// Effective page size; the row count when the list was not paged.
    pub limit: i64,
    pub total_pages: i64,
}
