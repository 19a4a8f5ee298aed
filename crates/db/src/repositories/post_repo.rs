//! Repository for the `posts` table.

use boganto_core::pagination::{contains_pattern, PageWindow};
use boganto_core::ranking::{tag_terms, CATEGORY_MATCH_WEIGHT, TAG_MATCH_WEIGHT};
use boganto_core::slug::{slug_candidate, MAX_SLUG_ATTEMPTS};
use boganto_core::types::DbId;
use sqlx::{Connection, PgConnection, PgPool};

use crate::is_unique_violation;
use crate::models::post::{NewPost, PostChanges, PostFilter, PostKey, PostRow, RelatedPostRow};

/// Name of the unique constraint on `posts.slug`.
pub const SLUG_CONSTRAINT: &str = "uq_posts_slug";

/// Columns of a [`PostRow`], with `posts` aliased as `p` and `categories` as `c`.
const VIEW_COLUMNS: &str = "p.id, p.title, p.slug, p.content, p.excerpt, \
    p.featured_image, p.featured_image_2, p.category_id, \
    c.name AS category_name, c.slug AS category_slug, p.tags, \
    p.meta_title, p.meta_description, p.is_featured, p.status, \
    p.view_count, p.created_at, p.updated_at";

/// Shared WHERE clause for [`PostRepo::list`] and [`PostRepo::count`].
const LIST_FILTER: &str = "($1::TEXT IS NULL OR p.status = $1)
      AND ($2::TEXT IS NULL OR c.slug = $2)
      AND ($3::TEXT IS NULL OR p.tags LIKE $3)
      AND ($4::BOOLEAN IS NULL OR p.is_featured = $4)
      AND ($5::TEXT IS NULL OR p.title ILIKE $5 OR p.content ILIKE $5 OR p.tags ILIKE $5)";

/// Provides persistence for blog posts.
pub struct PostRepo;

impl PostRepo {
    /// Whether any post already uses `slug`.
    pub async fn slug_exists(conn: &mut PgConnection, slug: &str) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(conn)
            .await?;
        Ok(row.0)
    }

    /// Whether a post with `id` exists, in any status.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Insert a post under a unique slug derived from `base_slug`.
    ///
    /// The bare slug is used when free. Otherwise a timestamp suffix is
    /// tried, then counter suffixes. Each attempt runs inside its own
    /// savepoint so a unique violation from a concurrent writer can be
    /// retried without aborting an enclosing transaction. When every
    /// attempt collides the last unique violation is returned.
    pub async fn create(
        conn: &mut PgConnection,
        post: &NewPost,
        base_slug: &str,
    ) -> Result<(DbId, String), sqlx::Error> {
        let timestamp = chrono::Utc::now().timestamp();
        let first = u32::from(Self::slug_exists(&mut *conn, base_slug).await?);
        let last = first + MAX_SLUG_ATTEMPTS - 1;

        let mut attempt = first;
        loop {
            let slug = slug_candidate(base_slug, timestamp, attempt);
            let mut savepoint = conn.begin().await?;
            match Self::insert(&mut *savepoint, post, &slug).await {
                Ok(id) => {
                    savepoint.commit().await?;
                    return Ok((id, slug));
                }
                Err(e) if attempt < last && is_unique_violation(&e, SLUG_CONSTRAINT) => {
                    savepoint.rollback().await?;
                    tracing::debug!(slug = %slug, attempt, "Slug taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn insert(conn: &mut PgConnection, post: &NewPost, slug: &str) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO posts
                (title, slug, content, excerpt, featured_image, featured_image_2,
                 category_id, tags, meta_title, meta_description, is_featured, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING id",
        )
        .bind(&post.title)
        .bind(slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(&post.featured_image_2)
        .bind(post.category_id)
        .bind(&post.tags)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(post.is_featured)
        .bind(post.status.as_str())
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Apply `changes` to a post. Returns the post's slug, or `None` if no
    /// post has this id.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        changes: &PostChanges,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "UPDATE posts SET
                title = $1,
                content = $2,
                category_id = $3,
                is_featured = $4,
                status = $5,
                slug = COALESCE($6, slug),
                excerpt = COALESCE($7, excerpt),
                tags = COALESCE($8, tags),
                meta_title = COALESCE($9, meta_title),
                meta_description = COALESCE($10, meta_description),
                featured_image = COALESCE($11, featured_image),
                featured_image_2 = COALESCE($12, featured_image_2),
                updated_at = NOW()
             WHERE id = $13
             RETURNING slug",
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(changes.category_id)
        .bind(changes.is_featured)
        .bind(changes.status.as_str())
        .bind(&changes.slug)
        .bind(&changes.excerpt)
        .bind(&changes.tags)
        .bind(&changes.meta_title)
        .bind(&changes.meta_description)
        .bind(&changes.featured_image)
        .bind(&changes.featured_image_2)
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|r| r.0))
    }

    /// Delete a post; its related books go with it. Returns `true` if a row
    /// was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch a post and count the read, in one statement.
    ///
    /// Unless `include_unpublished` is set only published posts match. The
    /// returned `view_count` already includes this read. Concurrent reads
    /// each add exactly one.
    pub async fn fetch_and_count(
        pool: &PgPool,
        key: &PostKey,
        include_unpublished: bool,
    ) -> Result<Option<PostRow>, sqlx::Error> {
        let key_filter = match key {
            PostKey::Id(_) => "id = $1",
            PostKey::Slug(_) => "slug = $1",
        };
        let query = format!(
            "WITH p AS (
                UPDATE posts SET view_count = view_count + 1
                WHERE {key_filter} AND ($2::BOOLEAN OR status = 'published')
                RETURNING *
             )
             SELECT {VIEW_COLUMNS}
             FROM p LEFT JOIN categories c ON c.id = p.category_id"
        );
        let q = sqlx::query_as::<_, PostRow>(&query);
        let q = match key {
            PostKey::Id(id) => q.bind(*id),
            PostKey::Slug(slug) => q.bind(slug.as_str()),
        };
        q.bind(include_unpublished).fetch_optional(pool).await
    }

    /// List posts matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &PostFilter,
        window: &PageWindow,
    ) -> Result<Vec<PostRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS}
             FROM posts p LEFT JOIN categories c ON c.id = p.category_id
             WHERE {LIST_FILTER}
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $6 OFFSET $7"
        );
        Self::bind_filter(sqlx::query_as::<_, PostRow>(&query), filter)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(pool)
            .await
    }

    /// Count posts matching `filter`, ignoring paging.
    pub async fn count(pool: &PgPool, filter: &PostFilter) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*)
             FROM posts p LEFT JOIN categories c ON c.id = p.category_id
             WHERE {LIST_FILTER}"
        );
        let row: (i64,) = Self::bind_filter(sqlx::query_as(&query), filter)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    fn bind_filter<'q, O>(
        query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
        filter: &'q PostFilter,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        query
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.category_slug.as_deref())
            .bind(filter.tag.as_deref().map(contains_pattern))
            .bind(filter.featured)
            .bind(filter.search.as_deref().map(contains_pattern))
    }

    /// Published posts related to `source`, best match first.
    ///
    /// A candidate scores for sharing the source's category and, once, for
    /// containing any of the source's tag terms in its tag string. Candidates
    /// scoring zero are excluded, as is the source itself. Ties go to the
    /// newer post.
    pub async fn related(
        pool: &PgPool,
        source: &PostRow,
        limit: i64,
    ) -> Result<Vec<RelatedPostRow>, sqlx::Error> {
        let terms = tag_terms(&source.tags);
        sqlx::query_as::<_, RelatedPostRow>(
            "SELECT * FROM (
                SELECT p.id, p.title, p.slug, p.excerpt, p.featured_image, p.category_id,
                       c.name AS category_name, c.slug AS category_slug, p.tags,
                       p.view_count, p.created_at,
                       (CASE WHEN p.category_id = $2 THEN $4::INT4 ELSE 0 END
                        + CASE WHEN EXISTS (
                              SELECT 1 FROM unnest($3::TEXT[]) AS t(term)
                              WHERE strpos(p.tags, t.term) > 0
                          ) THEN $5::INT4 ELSE 0 END)::INT4 AS relevance_score
                FROM posts p LEFT JOIN categories c ON c.id = p.category_id
                WHERE p.id <> $1 AND p.status = 'published'
             ) ranked
             WHERE relevance_score > 0
             ORDER BY relevance_score DESC, created_at DESC, id DESC
             LIMIT $6",
        )
        .bind(source.id)
        .bind(source.category_id)
        .bind(&terms)
        .bind(CATEGORY_MATCH_WEIGHT)
        .bind(TAG_MATCH_WEIGHT)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
