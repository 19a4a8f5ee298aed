//! Post write and read orchestration.
//!
//! Writes validate the submission, store uploaded images, then persist the
//! post and (when supplied) replace its related books. Depending on
//! [`ServerConfig::related_books_atomic`](crate::config::ServerConfig) the
//! book replacement either shares the post's transaction or runs after it,
//! in which case a failure is reported as a warning instead of an error.
//!
//! Images are stored before any database write. If the write then fails the
//! files stay on disk unreferenced.

use std::collections::HashMap;

use boganto_core::error::CoreError;
use boganto_core::image::{is_untrusted, managed_path};
use boganto_core::pagination::{resolve_page, total_pages};
use boganto_core::post::{
    derive_excerpt, non_blank, parse_category_id, parse_flag, validate_post_fields,
    PartialFailure, PartialFailureKind, PostFieldsInput, PostStatus, RelatedBookInput,
    ValidatedPost, WriteOutcome,
};
use boganto_core::ranking::DEFAULT_RELATED_LIMIT;
use boganto_core::slug::generate_slug;
use boganto_core::types::DbId;
use boganto_core::upload::{UploadedFile, SUBFOLDER_BOOK_COVERS};
use boganto_db::models::post::{NewPost, PostChanges, PostFilter, PostKey, PostView};
use boganto_db::models::related_book::NewRelatedBook;
use boganto_db::repositories::{CategoryRepo, PostRepo, RelatedBookRepo};
use sqlx::PgConnection;

use crate::error::{AppError, AppResult};
use crate::payload::PostSubmission;
use crate::query::PostListParams;
use crate::response::ListResponse;
use crate::state::AppState;

const ENTITY: &str = "Post";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Create a post from a normalized submission.
pub async fn create_post(state: &AppState, submission: PostSubmission) -> AppResult<WriteOutcome> {
    let PostSubmission {
        fields,
        featured_image,
        featured_image_2,
        book_covers,
    } = submission;

    let post = validate(state, &fields).await?;

    let featured_image = store_optional(state, featured_image.as_ref()).await?;
    let featured_image_2 = store_optional(state, featured_image_2.as_ref()).await?;

    let mut warnings = Vec::new();
    let books = match fields.related_books {
        Some(inputs) => Some(prepare_books(state, inputs, book_covers, &mut warnings).await),
        None => None,
    };

    let excerpt = post
        .excerpt
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| derive_excerpt(&post.content));
    let new_post = NewPost {
        meta_title: post
            .meta_title
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| post.title.clone()),
        meta_description: post
            .meta_description
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| excerpt.clone()),
        excerpt,
        featured_image,
        featured_image_2,
        category_id: post.category_id,
        tags: post.tags.clone().unwrap_or_default(),
        is_featured: post.is_featured,
        status: post.status,
        title: post.title,
        content: post.content,
    };
    let base_slug = generate_slug(&new_post.title);

    let (id, slug) = if state.config.related_books_atomic {
        let mut tx = state.pool.begin().await?;
        let (id, slug) = PostRepo::create(&mut tx, &new_post, &base_slug).await?;
        if let Some(books) = &books {
            RelatedBookRepo::replace_all(&mut tx, id, books).await?;
        }
        tx.commit().await?;
        (id, slug)
    } else {
        let mut conn = state.pool.acquire().await?;
        let (id, slug) = PostRepo::create(&mut conn, &new_post, &base_slug).await?;
        if let Some(books) = &books {
            replace_books_best_effort(&mut conn, id, books, &mut warnings).await;
        }
        (id, slug)
    };

    tracing::info!(post_id = id, slug = %slug, warnings = warnings.len(), "Post created");
    Ok(WriteOutcome { id, slug, warnings })
}

/// Update a post.
///
/// Title, content and category must always be supplied. Images are only
/// replaced when a new file is uploaded; related books only when a
/// `related_books` list is present.
pub async fn update_post(
    state: &AppState,
    id: DbId,
    submission: PostSubmission,
) -> AppResult<WriteOutcome> {
    if !PostRepo::exists(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: ENTITY, id }.into());
    }

    let PostSubmission {
        fields,
        featured_image,
        featured_image_2,
        book_covers,
    } = submission;

    let post = validate(state, &fields).await?;

    let featured_image = store_optional(state, featured_image.as_ref()).await?;
    let featured_image_2 = store_optional(state, featured_image_2.as_ref()).await?;

    let mut warnings = Vec::new();
    let books = match fields.related_books {
        Some(inputs) => Some(prepare_books(state, inputs, book_covers, &mut warnings).await),
        None => None,
    };

    let changes = PostChanges {
        title: post.title,
        content: post.content,
        category_id: post.category_id,
        is_featured: post.is_featured,
        status: post.status,
        slug: post.slug,
        excerpt: post.excerpt,
        tags: post.tags,
        meta_title: post.meta_title,
        meta_description: post.meta_description,
        featured_image,
        featured_image_2,
    };

    let not_found = || AppError::from(CoreError::NotFound { entity: ENTITY, id });

    let slug = if state.config.related_books_atomic {
        let mut tx = state.pool.begin().await?;
        let slug = PostRepo::update(&mut tx, id, &changes)
            .await?
            .ok_or_else(not_found)?;
        if let Some(books) = &books {
            RelatedBookRepo::replace_all(&mut tx, id, books).await?;
        }
        tx.commit().await?;
        slug
    } else {
        let mut conn = state.pool.acquire().await?;
        let slug = PostRepo::update(&mut conn, id, &changes)
            .await?
            .ok_or_else(not_found)?;
        if let Some(books) = &books {
            replace_books_best_effort(&mut conn, id, books, &mut warnings).await;
        }
        slug
    };

    tracing::info!(post_id = id, slug = %slug, warnings = warnings.len(), "Post updated");
    Ok(WriteOutcome { id, slug, warnings })
}

/// Hard-delete a post. Related books are removed by the database.
pub async fn delete_post(state: &AppState, id: DbId) -> AppResult<()> {
    if !PostRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: ENTITY, id }.into());
    }
    tracing::info!(post_id = id, "Post deleted");
    Ok(())
}

async fn validate(state: &AppState, fields: &PostFieldsInput) -> AppResult<ValidatedPost> {
    let category_known = match parse_category_id(fields.category_id.as_deref()) {
        Some(category_id) => CategoryRepo::find_by_id(&state.pool, category_id)
            .await?
            .is_some(),
        None => false,
    };
    Ok(validate_post_fields(fields, category_known)?)
}

async fn store_optional(state: &AppState, file: Option<&UploadedFile>) -> AppResult<Option<String>> {
    match file {
        Some(file) => Ok(Some(state.images.store(file, None).await?)),
        None => Ok(None),
    }
}

/// Turn submitted book entries into rows, recording a warning for each
/// entry that is skipped or whose cover could not be stored.
///
/// A cover uploaded for an entry's index wins over the entry's
/// `cover_image` string; the string is kept only if it is a managed path.
async fn prepare_books(
    state: &AppState,
    inputs: Vec<RelatedBookInput>,
    mut covers: HashMap<usize, UploadedFile>,
    warnings: &mut Vec<PartialFailure>,
) -> Vec<NewRelatedBook> {
    let mut books = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        let RelatedBookInput {
            title: Some(title),
            purchase_link: Some(purchase_link),
            author,
            cover_image,
            description,
            price,
        } = input
        else {
            let reason = input.rejection().unwrap_or_default();
            tracing::warn!(index, reason = %reason, "Skipping related book");
            warnings.push(PartialFailure::new(
                PartialFailureKind::RelatedBookSkipped,
                Some(index),
                format!("Related book {index} skipped: {reason}"),
            ));
            continue;
        };

        if cover_image.as_deref().is_some_and(is_untrusted) {
            tracing::warn!(index, "Dropping external cover image");
        }
        let submitted_cover = cover_image.as_deref().and_then(managed_path);
        let cover_image = match covers.remove(&index) {
            Some(file) => match state.images.store(&file, Some(SUBFOLDER_BOOK_COVERS)).await {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Book cover upload failed");
                    warnings.push(PartialFailure::new(
                        PartialFailureKind::CoverUploadFailed,
                        Some(index),
                        format!("Cover for related book {index} not stored: {e}"),
                    ));
                    submitted_cover
                }
            },
            None => submitted_cover,
        };

        books.push(NewRelatedBook {
            position: i32::try_from(index).unwrap_or(i32::MAX),
            title,
            author,
            purchase_link,
            cover_image,
            description,
            price,
        });
    }

    books
}

async fn replace_books_best_effort(
    conn: &mut PgConnection,
    post_id: DbId,
    books: &[NewRelatedBook],
    warnings: &mut Vec<PartialFailure>,
) {
    if let Err(e) = RelatedBookRepo::replace_all(conn, post_id, books).await {
        tracing::warn!(post_id, error = %e, "Related books not saved");
        warnings.push(PartialFailure::new(
            PartialFailureKind::RelatedBooksNotSaved,
            None,
            "The post was saved but its related books could not be updated",
        ));
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetch one post with its books and related posts, counting the view.
///
/// Non-admin callers only see published posts.
pub async fn fetch_post(state: &AppState, key: PostKey, is_admin: bool) -> AppResult<PostView> {
    let row = PostRepo::fetch_and_count(&state.pool, &key, is_admin)
        .await?
        .ok_or_else(|| match &key {
            PostKey::Id(id) => CoreError::NotFound { entity: ENTITY, id: *id },
            PostKey::Slug(slug) => CoreError::NotFoundBySlug {
                entity: ENTITY,
                slug: slug.clone(),
            },
        })?;

    let books = RelatedBookRepo::list_for_post(&state.pool, row.id).await?;

    // Recommendations are decoration; a failure here must not fail the read.
    let related = match PostRepo::related(&state.pool, &row, DEFAULT_RELATED_LIMIT).await {
        Ok(related) => related,
        Err(e) => {
            tracing::warn!(post_id = row.id, error = %e, "Related posts unavailable");
            Vec::new()
        }
    };

    Ok(PostView::assemble(row, books, Some(related), state.public_base()))
}

/// List posts, each with its related books.
///
/// Non-admin callers always get published posts only, whatever `status`
/// they ask for.
pub async fn list_posts(
    state: &AppState,
    params: PostListParams,
    is_admin: bool,
) -> AppResult<ListResponse<PostView>> {
    let status = if is_admin {
        match params.status.and_then(non_blank).as_deref() {
            None | Some("all") => None,
            Some(raw) => Some(raw.parse::<PostStatus>()?),
        }
    } else {
        Some(PostStatus::Published)
    };

    let filter = PostFilter {
        status,
        category_slug: params.category.and_then(non_blank),
        tag: params.tag.and_then(non_blank),
        featured: params.featured.and_then(non_blank).map(|f| parse_flag(&f)),
        search: params.search.and_then(non_blank),
    };
    let window = resolve_page(params.page, params.limit);

    let rows = PostRepo::list(&state.pool, &filter, &window).await?;
    let total = PostRepo::count(&state.pool, &filter).await?;

    let ids: Vec<DbId> = rows.iter().map(|r| r.id).collect();
    let mut books = RelatedBookRepo::list_for_posts(&state.pool, &ids).await?;

    let data: Vec<PostView> = rows
        .into_iter()
        .map(|row| {
            let post_books = books.remove(&row.id).unwrap_or_default();
            PostView::assemble(row, post_books, None, state.public_base())
        })
        .collect();

    Ok(ListResponse {
        total,
        page: window.page,
        limit: window.limit.unwrap_or(data.len() as i64),
        total_pages: total_pages(total, window.limit),
        data,
    })
}
