//! Repository for the `book_contributors` table.

use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::contributor::{Contributor, CreateContributor};

const COLUMNS: &str = "id, book_id, name, role, prefix, first_name, middle_name, last_name, \
                        suffix, created_at";

/// Contributors of a book. Callers check book ownership first.
pub struct ContributorRepo;

impl ContributorRepo {
    /// Insert a contributor. `name` is the display name the caller resolved
    /// from `input`.
    pub async fn create(
        pool: &PgPool,
        book_id: DbId,
        name: &str,
        input: &CreateContributor,
    ) -> Result<Contributor, sqlx::Error> {
        let query = format!(
            "INSERT INTO book_contributors
                (book_id, name, role, prefix, first_name, middle_name, last_name, suffix)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contributor>(&query)
            .bind(book_id)
            .bind(name)
            .bind(&input.role)
            .bind(&input.prefix)
            .bind(&input.first_name)
            .bind(&input.middle_name)
            .bind(&input.last_name)
            .bind(&input.suffix)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_book(
        pool: &PgPool,
        book_id: DbId,
    ) -> Result<Vec<Contributor>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM book_contributors WHERE book_id = $1 ORDER BY id");
        sqlx::query_as::<_, Contributor>(&query)
            .bind(book_id)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, book_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM book_contributors WHERE id = $1 AND book_id = $2")
            .bind(id)
            .bind(book_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
