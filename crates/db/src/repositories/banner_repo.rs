//! Repository for the `hero_banners` table.

use boganto_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::banner::{BannerChanges, BannerRow, NewBanner};

/// Columns of a [`BannerRow`], with the banner aliased as `b` and the linked
/// post as `p`.
const VIEW_COLUMNS: &str = "b.id, b.title, b.subtitle, b.image_url, b.post_id, \
    p.title AS post_title, p.slug AS post_slug, b.link_url, b.sort_order, \
    b.is_active, b.created_at, b.updated_at";

/// Provides persistence for homepage hero banners.
pub struct BannerRepo;

impl BannerRepo {
    /// Banners in carousel order. `active_only` hides inactive ones.
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<BannerRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS}
             FROM hero_banners b LEFT JOIN posts p ON p.id = b.post_id
             WHERE (NOT $1::BOOLEAN OR b.is_active)
             ORDER BY b.sort_order ASC, b.id ASC"
        );
        sqlx::query_as::<_, BannerRow>(&query)
            .bind(active_only)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<BannerRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VIEW_COLUMNS}
             FROM hero_banners b LEFT JOIN posts p ON p.id = b.post_id
             WHERE b.id = $1"
        );
        sqlx::query_as::<_, BannerRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Serialize writers that may change the number of active banners.
    ///
    /// Must be called inside a transaction; the lock is held until it ends.
    pub async fn lock_for_activation(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("LOCK TABLE hero_banners IN SHARE ROW EXCLUSIVE MODE")
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Count active banners, optionally ignoring one.
    pub async fn count_active_excluding(
        conn: &mut PgConnection,
        exclude_id: Option<DbId>,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM hero_banners
             WHERE is_active AND ($1::BIGINT IS NULL OR id <> $1)",
        )
        .bind(exclude_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    pub async fn create(conn: &mut PgConnection, input: &NewBanner) -> Result<BannerRow, sqlx::Error> {
        let query = format!(
            "WITH b AS (
                INSERT INTO hero_banners
                    (title, subtitle, image_url, post_id, link_url, sort_order, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
             )
             SELECT {VIEW_COLUMNS} FROM b LEFT JOIN posts p ON p.id = b.post_id"
        );
        sqlx::query_as::<_, BannerRow>(&query)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.image_url)
            .bind(input.post_id)
            .bind(&input.link_url)
            .bind(input.sort_order)
            .bind(input.is_active)
            .fetch_one(conn)
            .await
    }

    /// Update a banner. Returns the updated row, or `None` if not found.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &BannerChanges,
    ) -> Result<Option<BannerRow>, sqlx::Error> {
        let query = format!(
            "WITH b AS (
                UPDATE hero_banners SET
                    title = $1,
                    subtitle = $2,
                    image_url = COALESCE($3, image_url),
                    post_id = $4,
                    link_url = $5,
                    sort_order = $6,
                    is_active = $7,
                    updated_at = NOW()
                WHERE id = $8
                RETURNING *
             )
             SELECT {VIEW_COLUMNS} FROM b LEFT JOIN posts p ON p.id = b.post_id"
        );
        sqlx::query_as::<_, BannerRow>(&query)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.image_url)
            .bind(input.post_id)
            .bind(&input.link_url)
            .bind(input.sort_order)
            .bind(input.is_active)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Delete a banner. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM hero_banners WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
