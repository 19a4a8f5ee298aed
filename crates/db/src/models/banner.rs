//! Hero banner models.

use boganto_core::image::resolve_public_image;
use boganto_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `hero_banners` joined with the linked post's title and slug.
#[derive(Debug, Clone, FromRow)]
pub struct BannerRow {
    pub id: DbId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub post_id: Option<DbId>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A banner ready to insert.
#[derive(Debug, Clone)]
pub struct NewBanner {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub post_id: Option<DbId>,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Full replacement of a banner's fields. `image_url: None` keeps the
/// stored image.
#[derive(Debug, Clone)]
pub struct BannerChanges {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub post_id: Option<DbId>,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BannerView {
    pub id: DbId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub post_id: Option<DbId>,
    pub post_title: Option<String>,
    pub post_slug: Option<String>,
    pub link_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BannerView {
    pub fn from_row(row: BannerRow, public_base: &str) -> Self {
        Self {
            image_url: resolve_public_image(public_base, Some(&row.image_url)),
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            post_id: row.post_id,
            post_title: row.post_title,
            post_slug: row.post_slug,
            link_url: row.link_url,
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
