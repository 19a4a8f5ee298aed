//! Repository for the `related_books` table.

use std::collections::HashMap;

use boganto_core::types::DbId;
use sqlx::{Connection, PgConnection, PgPool};

use crate::models::related_book::{NewRelatedBook, RelatedBook};

const COLUMNS: &str = "id, post_id, position, title, author, purchase_link, \
    cover_image, description, price, created_at";

/// Provides persistence for books attached to posts.
pub struct RelatedBookRepo;

impl RelatedBookRepo {
    /// Replace a post's whole book set with `books`.
    ///
    /// Runs in its own transaction (a savepoint when `conn` is already
    /// inside one), so either the old set or the new set survives.
    pub async fn replace_all(
        conn: &mut PgConnection,
        post_id: DbId,
        books: &[NewRelatedBook],
    ) -> Result<usize, sqlx::Error> {
        let mut tx = conn.begin().await?;

        sqlx::query("DELETE FROM related_books WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        for book in books {
            sqlx::query(
                "INSERT INTO related_books
                    (post_id, position, title, author, purchase_link,
                     cover_image, description, price)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(post_id)
            .bind(book.position)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.purchase_link)
            .bind(&book.cover_image)
            .bind(&book.description)
            .bind(&book.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(books.len())
    }

    /// Books for one post in display order.
    pub async fn list_for_post(pool: &PgPool, post_id: DbId) -> Result<Vec<RelatedBook>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM related_books
             WHERE post_id = $1
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, RelatedBook>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }

    /// Books for several posts at once, grouped by post id.
    ///
    /// Posts without books are absent from the map.
    pub async fn list_for_posts(
        pool: &PgPool,
        post_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<RelatedBook>>, sqlx::Error> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM related_books
             WHERE post_id = ANY($1)
             ORDER BY post_id, position ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, RelatedBook>(&query)
            .bind(post_ids)
            .fetch_all(pool)
            .await?;

        let mut grouped: HashMap<DbId, Vec<RelatedBook>> = HashMap::new();
        for row in rows {
            grouped.entry(row.post_id).or_default().push(row);
        }
        Ok(grouped)
    }
}
