//! Post models, write DTOs, and the client-facing [`PostView`].

use boganto_core::image::resolve_public_image;
use boganto_core::post::{split_tags, PostStatus};
use boganto_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::related_book::{RelatedBook, RelatedBookView};

/// A row from `posts` joined with its category.
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub featured_image_2: Option<String>,
    pub category_id: Option<DbId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub tags: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_featured: bool,
    pub status: String,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A post ready to insert. The slug is chosen by the repository.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub featured_image_2: Option<String>,
    pub category_id: DbId,
    pub tags: String,
    pub meta_title: String,
    pub meta_description: String,
    pub is_featured: bool,
    pub status: PostStatus,
}

/// Column values for an update.
///
/// Title, content, category, `is_featured` and status are always written.
/// Every `Option` field is written only when `Some`; `None` leaves the stored
/// value alone, which is how an update without a new image keeps the old one.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub category_id: DbId,
    pub is_featured: bool,
    pub status: PostStatus,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub tags: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub featured_image: Option<String>,
    pub featured_image_2: Option<String>,
}

/// What a single-post read looks the post up by.
#[derive(Debug, Clone)]
pub enum PostKey {
    Id(DbId),
    Slug(String),
}

/// Filters for listing posts. `None` disables a filter.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub category_slug: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

/// A ranked sibling post returned by the related-content query.
#[derive(Debug, Clone, FromRow)]
pub struct RelatedPostRow {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category_id: Option<DbId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub tags: String,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub relevance_score: i32,
}

/// Nested category object on a [`PostView`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRef {
    pub id: DbId,
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// A related post summary. Never carries the full content.
#[derive(Debug, Clone, Serialize)]
pub struct RelatedPostView {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category_id: Option<DbId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub relevance_score: i32,
}

impl RelatedPostView {
    pub fn from_row(row: RelatedPostRow, public_base: &str) -> Self {
        Self {
            featured_image: resolve_public_image(public_base, row.featured_image.as_deref()),
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            category_id: row.category_id,
            category_name: row.category_name,
            category_slug: row.category_slug,
            view_count: row.view_count,
            created_at: row.created_at,
            relevance_score: row.relevance_score,
        }
    }
}

/// A post as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub featured_image_2: Option<String>,
    pub category_id: Option<DbId>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    pub category: Option<CategoryRef>,
    pub tags: Vec<String>,
    pub meta_title: String,
    pub meta_description: String,
    pub is_featured: bool,
    pub status: String,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub related_books: Vec<RelatedBookView>,
    /// Present on single-post reads only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_posts: Option<Vec<RelatedPostView>>,
}

impl PostView {
    /// Shape a post row, its books, and (for single reads) its ranked
    /// siblings into the public representation.
    ///
    /// Untrusted external image URLs are dropped and managed paths are
    /// expanded against `public_base`. The flat `category_*` fields and the
    /// nested `category` object are filled from the same values.
    pub fn assemble(
        row: PostRow,
        books: Vec<RelatedBook>,
        related: Option<Vec<RelatedPostRow>>,
        public_base: &str,
    ) -> Self {
        let category = row.category_id.map(|id| CategoryRef {
            id,
            name: row.category_name.clone(),
            slug: row.category_slug.clone(),
        });

        Self {
            featured_image: resolve_public_image(public_base, row.featured_image.as_deref()),
            featured_image_2: resolve_public_image(public_base, row.featured_image_2.as_deref()),
            tags: split_tags(&row.tags),
            meta_title: row.meta_title.unwrap_or_default(),
            meta_description: row.meta_description.unwrap_or_default(),
            category,
            related_books: books
                .into_iter()
                .map(|b| RelatedBookView::from_row(b, public_base))
                .collect(),
            related_posts: related.map(|rows| {
                rows.into_iter()
                    .map(|r| RelatedPostView::from_row(r, public_base))
                    .collect()
            }),
            id: row.id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            category_id: row.category_id,
            category_name: row.category_name,
            category_slug: row.category_slug,
            is_featured: row.is_featured,
            status: row.status,
            view_count: row.view_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
