//! Repository for the `projects` table.

use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProject, Project, ProjectWithStats, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, subtitle, description, categories, keywords, status, \
                        language, primary_marketplace, publication_date, cover_image_url, \
                        created_at, updated_at";

/// [`COLUMNS`] qualified with the `p` alias, for joins.
const P_COLUMNS: &str = "p.id, p.user_id, p.title, p.subtitle, p.description, p.categories, \
                          p.keywords, p.status, p.language, p.primary_marketplace, \
                          p.publication_date, p.cover_image_url, p.created_at, p.updated_at";

/// Book aggregates joined onto a project row.
const STATS_SELECT: &str = "COUNT(b.id) AS book_count, \
                             COALESCE(SUM(b.total_sales), 0)::BIGINT AS total_sales, \
                             COALESCE(SUM(b.total_revenue), 0)::DOUBLE PRECISION AS total_revenue";

/// Provides CRUD operations for projects. Every query is scoped to a user.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// If `status` is `None` in the input, defaults to `draft`.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &CreateProject,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, title, subtitle, description, categories, keywords,
                                   status, language, primary_marketplace, publication_date,
                                   cover_image_url)
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'), COALESCE($6, '{{}}'),
                     COALESCE($7, 'draft'), COALESCE($8, 'English'), COALESCE($9, 'Amazon.com'),
                     $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.description)
            .bind(&input.categories)
            .bind(&input.keywords)
            .bind(&input.status)
            .bind(&input.language)
            .bind(&input.primary_marketplace)
            .bind(input.publication_date)
            .bind(&input.cover_image_url)
            .fetch_one(pool)
            .await
    }

    /// Find one of the user's projects.
    pub async fn find_by_id(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find one of the user's projects with its book aggregates.
    pub async fn find_with_stats(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<ProjectWithStats>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS}, {STATS_SELECT}
             FROM projects p LEFT JOIN books b ON b.project_id = p.id
             WHERE p.id = $1 AND p.user_id = $2
             GROUP BY p.id"
        );
        sqlx::query_as::<_, ProjectWithStats>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List the user's projects with book aggregates, most recently updated first.
    pub async fn list_with_stats(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<ProjectWithStats>, sqlx::Error> {
        let query = format!(
            "SELECT {P_COLUMNS}, {STATS_SELECT}
             FROM projects p LEFT JOIN books b ON b.project_id = p.id
             WHERE p.user_id = $1
             GROUP BY p.id
             ORDER BY p.updated_at DESC"
        );
        sqlx::query_as::<_, ProjectWithStats>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the user has no project with the given `id`.
    pub async fn update(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($3, title),
                subtitle = COALESCE($4, subtitle),
                description = COALESCE($5, description),
                categories = COALESCE($6, categories),
                keywords = COALESCE($7, keywords),
                status = COALESCE($8, status),
                language = COALESCE($9, language),
                primary_marketplace = COALESCE($10, primary_marketplace),
                publication_date = COALESCE($11, publication_date),
                cover_image_url = COALESCE($12, cover_image_url)
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.title)
            .bind(&input.subtitle)
            .bind(&input.description)
            .bind(&input.categories)
            .bind(&input.keywords)
            .bind(&input.status)
            .bind(&input.language)
            .bind(&input.primary_marketplace)
            .bind(input.publication_date)
            .bind(&input.cover_image_url)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project. Its books are deleted when `delete_books` is set,
    /// otherwise unlinked. Both happen in one transaction.
    ///
    /// Returns `true` if the project existed.
    pub async fn delete(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
        delete_books: bool,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let books_sql = if delete_books {
            "DELETE FROM books WHERE project_id = $1 AND user_id = $2"
        } else {
            "UPDATE books SET project_id = NULL WHERE project_id = $1 AND user_id = $2"
        };
        sqlx::query(books_sql)
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy a project as `"<title> (Copy)"` in `draft` status. Books are not
    /// copied.
    pub async fn duplicate(
        pool: &PgPool,
        user_id: DbId,
        id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (user_id, title, subtitle, description, categories, keywords,
                                   status, language, primary_marketplace, publication_date,
                                   cover_image_url)
             SELECT user_id, title || ' (Copy)', subtitle, description, categories, keywords,
                    'draft', language, primary_marketplace, NULL, cover_image_url
             FROM projects WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Number of the user's projects in `status`.
    pub async fn count_by_status(
        pool: &PgPool,
        user_id: DbId,
        status: &str,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM projects WHERE user_id = $1 AND status = $2")
                .bind(user_id)
                .bind(status)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
