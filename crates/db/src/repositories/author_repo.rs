//! Repository for the `authors` table.

use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::author::{Author, AuthorWithCounts, CreateAuthor, UpdateAuthor};
use crate::models::book::Book;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, prefix, first_name, middle_name, last_name, suffix, \
                        full_name, biography, profile_image_url, is_active, created_at, updated_at";

/// [`COLUMNS`] qualified with the `a` alias, for joins.
const A_COLUMNS: &str = "a.id, a.user_id, a.prefix, a.first_name, a.middle_name, a.last_name, \
                          a.suffix, a.full_name, a.biography, a.profile_image_url, a.is_active, \
                          a.created_at, a.updated_at";

/// SQL expression joining the non-blank name parts with single spaces.
fn full_name_expr(prefix: &str, first: &str, middle: &str, last: &str, suffix: &str) -> String {
    format!(
        "concat_ws(' ', NULLIF(btrim({prefix}), ''), NULLIF(btrim({first}), ''), \
         NULLIF(btrim({middle}), ''), NULLIF(btrim({last}), ''), NULLIF(btrim({suffix}), ''))"
    )
}

pub struct AuthorRepo;

impl AuthorRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateAuthor,
    ) -> Result<Author, sqlx::Error> {
        let full_name = full_name_expr("$2", "$3", "$4", "$5", "$6");
        let query = format!(
            "INSERT INTO authors (user_id, prefix, first_name, middle_name, last_name, suffix,
                                  full_name, biography, profile_image_url)
             VALUES ($1, $2, $3, $4, $5, $6, {full_name}, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(user_id)
            .bind(&input.prefix)
            .bind(&input.first_name)
            .bind(&input.middle_name)
            .bind(&input.last_name)
            .bind(&input.suffix)
            .bind(&input.biography)
            .bind(&input.profile_image_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Author>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM authors WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive match on first and last name. A `None` last name
    /// only matches authors without one.
    pub async fn find_by_name(
        pool: &PgPool,
        user_id: DbId,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Result<Option<Author>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM authors
             WHERE user_id = $1
               AND lower(first_name) = lower($2)
               AND lower(COALESCE(last_name, '')) = lower(COALESCE($3, ''))
             ORDER BY id
             LIMIT 1"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(user_id)
            .bind(first_name)
            .bind(last_name)
            .fetch_optional(pool)
            .await
    }

    /// The user's authors with linked book counts, by full name.
    pub async fn list_with_counts(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<AuthorWithCounts>, sqlx::Error> {
        let query = format!(
            "SELECT {A_COLUMNS}, COUNT(b.id) AS book_count
             FROM authors a LEFT JOIN books b ON b.author_id = a.id
             WHERE a.user_id = $1
             GROUP BY a.id
             ORDER BY a.full_name"
        );
        sqlx::query_as::<_, AuthorWithCounts>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update an author. `full_name` is re-rendered from the merged parts.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateAuthor,
    ) -> Result<Option<Author>, sqlx::Error> {
        let full_name = full_name_expr(
            "COALESCE($3, prefix)",
            "COALESCE($4, first_name)",
            "COALESCE($5, middle_name)",
            "COALESCE($6, last_name)",
            "COALESCE($7, suffix)",
        );
        let query = format!(
            "UPDATE authors SET
                prefix = COALESCE($3, prefix),
                first_name = COALESCE($4, first_name),
                middle_name = COALESCE($5, middle_name),
                last_name = COALESCE($6, last_name),
                suffix = COALESCE($7, suffix),
                full_name = {full_name},
                biography = COALESCE($8, biography),
                profile_image_url = COALESCE($9, profile_image_url),
                is_active = COALESCE($10, is_active)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Author>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.prefix)
            .bind(&input.first_name)
            .bind(&input.middle_name)
            .bind(&input.last_name)
            .bind(&input.suffix)
            .bind(&input.biography)
            .bind(&input.profile_image_url)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete an author. Linked books keep their inline author fields and
    /// lose the link.
    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Books linked to the author.
    pub async fn list_books(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Vec<Book>, sqlx::Error> {
        crate::repositories::BookRepo::list_by_author(pool, user_id, id).await
    }
}
