//! Repository for the `books` table.

use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::book::{Book, BookFilter, CreateBook, UpdateBook};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, project_id, author_id, title, subtitle, description, \
                        categories, keywords, status, language, author_prefix, author_first_name, \
                        author_middle_name, author_last_name, author_suffix, primary_marketplace, \
                        format, isbn, isbn_placeholder, asin, publication_date, cover_image_url, \
                        total_sales, total_revenue, monthly_revenue, created_at, updated_at";

/// Provides CRUD operations for books. Every query is scoped to a user
/// except the global ISBN uniqueness checks.
pub struct BookRepo;

impl BookRepo {
    /// Insert a new book, returning the created row.
    ///
    /// Defaults: status `draft`, format `ebook`, language `English`,
    /// marketplace `Amazon.com`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateBook,
    ) -> Result<Book, sqlx::Error> {
        let query = format!(
            "INSERT INTO books (user_id, project_id, author_id, title, subtitle, description,
                                categories, keywords, status, language, author_prefix,
                                author_first_name, author_middle_name, author_last_name,
                                author_suffix, primary_marketplace, format, isbn,
                                isbn_placeholder, asin, publication_date, cover_image_url)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '{{}}'), COALESCE($8, '{{}}'),
                     COALESCE($9, 'draft'), COALESCE($10, 'English'), $11, $12, $13, $14, $15,
                     COALESCE($16, 'Amazon.com'), COALESCE($17, 'ebook'), $18, $19, $20, $21, $22)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(user_id)
            .bind(input.project_id)
            .bind(input.author_id)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.description)
            .bind(&input.categories)
            .bind(&input.keywords)
            .bind(&input.status)
            .bind(&input.language)
            .bind(&input.author_prefix)
            .bind(&input.author_first_name)
            .bind(&input.author_middle_name)
            .bind(&input.author_last_name)
            .bind(&input.author_suffix)
            .bind(&input.primary_marketplace)
            .bind(&input.format)
            .bind(&input.isbn)
            .bind(&input.isbn_placeholder)
            .bind(&input.asin)
            .bind(input.publication_date)
            .bind(&input.cover_image_url)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM books WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's books matching every set filter, most recently updated first.
    pub async fn list(
        pool: &PgPool,
        user_id: DbId,
        filter: &BookFilter,
    ) -> Result<Vec<Book>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM books
             WHERE user_id = $1
               AND ($2::BIGINT IS NULL OR project_id = $2)
               AND ($3::BIGINT IS NULL OR author_id = $3)
               AND ($4::TEXT IS NULL OR format = $4)
               AND ($5::TEXT IS NULL OR status = $5)
             ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(user_id)
            .bind(filter.project_id)
            .bind(filter.author_id)
            .bind(&filter.format)
            .bind(&filter.status)
            .fetch_all(pool)
            .await
    }

    pub async fn list_by_author(
        pool: &PgPool,
        user_id: DbId,
        author_id: DbId,
    ) -> Result<Vec<Book>, sqlx::Error> {
        let filter = BookFilter {
            author_id: Some(author_id),
            ..Default::default()
        };
        Self::list(pool, user_id, &filter).await
    }

    /// Find the user's book whose ASIN or ISBN equals `identifier`.
    pub async fn find_by_asin_or_isbn(
        pool: &PgPool,
        user_id: DbId,
        identifier: &str,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM books
             WHERE user_id = $1 AND (asin = $2 OR isbn = $2)
             ORDER BY id
             LIMIT 1"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(user_id)
            .bind(identifier)
            .fetch_optional(pool)
            .await
    }

    /// Identifiers (ASINs and ISBNs) of all the user's books.
    pub async fn identifiers(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT asin FROM books WHERE user_id = $1 AND asin IS NOT NULL
             UNION
             SELECT isbn FROM books WHERE user_id = $1 AND isbn IS NOT NULL",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Whether any book other than `exclude_id` uses `isbn` as its ISBN or
    /// placeholder.
    pub async fn isbn_exists(
        pool: &PgPool,
        isbn: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM books
                WHERE (isbn = $1 OR isbn_placeholder = $1)
                  AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    pub async fn placeholder_exists(pool: &PgPool, placeholder: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn_placeholder = $1)")
            .bind(placeholder)
            .fetch_one(pool)
            .await
    }

    /// Update a book. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateBook,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!(
            "UPDATE books SET
                project_id = COALESCE($3, project_id),
                author_id = COALESCE($4, author_id),
                title = COALESCE($5, title),
                subtitle = COALESCE($6, subtitle),
                description = COALESCE($7, description),
                categories = COALESCE($8, categories),
                keywords = COALESCE($9, keywords),
                status = COALESCE($10, status),
                language = COALESCE($11, language),
                author_prefix = COALESCE($12, author_prefix),
                author_first_name = COALESCE($13, author_first_name),
                author_middle_name = COALESCE($14, author_middle_name),
                author_last_name = COALESCE($15, author_last_name),
                author_suffix = COALESCE($16, author_suffix),
                primary_marketplace = COALESCE($17, primary_marketplace),
                format = COALESCE($18, format),
                isbn = COALESCE($19, isbn),
                asin = COALESCE($20, asin),
                publication_date = COALESCE($21, publication_date),
                cover_image_url = COALESCE($22, cover_image_url)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(user_id)
            .bind(input.project_id)
            .bind(input.author_id)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.description)
            .bind(&input.categories)
            .bind(&input.keywords)
            .bind(&input.status)
            .bind(&input.language)
            .bind(&input.author_prefix)
            .bind(&input.author_first_name)
            .bind(&input.author_middle_name)
            .bind(&input.author_last_name)
            .bind(&input.author_suffix)
            .bind(&input.primary_marketplace)
            .bind(&input.format)
            .bind(&input.isbn)
            .bind(&input.asin)
            .bind(input.publication_date)
            .bind(&input.cover_image_url)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, user_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy a book as `"<title> (Copy)"` in `draft` with a fresh placeholder.
    /// ISBN, ASIN and sales figures are not copied.
    pub async fn duplicate(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        placeholder: &str,
    ) -> Result<Option<Book>, sqlx::Error> {
        let query = format!(
            "INSERT INTO books (user_id, project_id, author_id, title, subtitle, description,
                                categories, keywords, status, language, author_prefix,
                                author_first_name, author_middle_name, author_last_name,
                                author_suffix, primary_marketplace, format, isbn_placeholder,
                                cover_image_url)
             SELECT user_id, project_id, author_id, title || ' (Copy)', subtitle, description,
                    categories, keywords, 'draft', language, author_prefix, author_first_name,
                    author_middle_name, author_last_name, author_suffix, primary_marketplace,
                    format, $3, cover_image_url
             FROM books WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(user_id)
            .bind(placeholder)
            .fetch_optional(pool)
            .await
    }

    /// Link a book to an author record.
    pub async fn set_author(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        author_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE books SET author_id = $3 WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .bind(author_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(pool)
            .await
    }
}
