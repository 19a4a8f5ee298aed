//! Related-book models.

use boganto_core::image::resolve_public_image;
use boganto_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `related_books` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RelatedBook {
    pub id: DbId,
    pub post_id: DbId,
    pub position: i32,
    pub title: String,
    pub author: Option<String>,
    pub purchase_link: String,
    pub cover_image: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub created_at: Timestamp,
}

/// A book ready to insert. `cover_image` is already a managed path or `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRelatedBook {
    /// Index of the entry in the submitted list.
    pub position: i32,
    pub title: String,
    pub author: Option<String>,
    pub purchase_link: String,
    pub cover_image: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
}

/// A related book as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedBookView {
    pub id: DbId,
    pub post_id: DbId,
    pub title: String,
    pub author: Option<String>,
    pub purchase_link: String,
    pub cover_image: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub created_at: Timestamp,
}

impl RelatedBookView {
    pub fn from_row(row: RelatedBook, public_base: &str) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            cover_image: resolve_public_image(public_base, row.cover_image.as_deref()),
            title: row.title,
            author: row.author,
            purchase_link: row.purchase_link,
            description: row.description,
            price: row.price,
            created_at: row.created_at,
        }
    }
}
