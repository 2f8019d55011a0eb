//! Accounts: lookup, admin search, role and activation changes, login
//! bookkeeping.

use kdpdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User, UserSearch};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
                            is_active, last_login_at, failed_login_count, locked_until, \
                            created_at, updated_at";

/// Matches any user when `$1` is NULL.
const SEARCH_FILTER: &str = "($1::TEXT IS NULL
                              OR username ILIKE $1 OR email ILIKE $1
                              OR first_name ILIKE $1 OR last_name ILIKE $1)";

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, first_name, last_name, role)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'user'))
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await
    }

    /// Exact, case-sensitive match.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// The account a login name refers to: a username match wins over an
    /// email match.
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username = $1 OR lower(email) = lower($1)
             ORDER BY (username = $1) DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(pool)
            .await
    }

    /// One page of matching users, newest first, and the match count.
    pub async fn search(
        pool: &PgPool,
        params: &UserSearch,
    ) -> Result<(Vec<User>, i64), sqlx::Error> {
        let pattern = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let page_sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {SEARCH_FILTER}
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        let users = sqlx::query_as::<_, User>(&page_sql)
            .bind(&pattern)
            .bind(params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE))
            .bind(params.offset.unwrap_or(0).max(0))
            .fetch_all(pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM users WHERE {SEARCH_FILTER}"))
                .bind(&pattern)
                .fetch_one(pool)
                .await?;

        Ok((users, total))
    }

    /// `None` when no such user.
    pub async fn set_role(pool: &PgPool, id: DbId, role: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("UPDATE users SET role = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_optional(pool)
            .await
    }

    /// `true` when the flag actually flipped.
    pub async fn set_active(pool: &PgPool, id: DbId, active: bool) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1 AND is_active <> $2")
                .bind(id)
                .bind(active)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count a wrong password. Reaching `threshold` consecutive failures
    /// locks the account for `lock_minutes`. Returns whether it is now locked.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        threshold: i32,
        lock_minutes: i32,
    ) -> Result<bool, sqlx::Error> {
        let locked: Option<bool> = sqlx::query_scalar(
            "UPDATE users SET
                failed_login_count = failed_login_count + 1,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $2 THEN NOW() + make_interval(mins => $3)
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING locked_until IS NOT NULL AND locked_until > NOW()",
        )
        .bind(id)
        .bind(threshold)
        .bind(lock_minutes)
        .fetch_optional(pool)
        .await?;
        Ok(locked.unwrap_or(false))
    }

    /// Clears the failure count and any lock, and stamps `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET failed_login_count = 0, locked_until = NULL, last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn count_by_role(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role")
            .fetch_all(pool)
            .await
    }

    /// Active users who logged in during the last `days` days.
    pub async fn count_active_since_days(pool: &PgPool, days: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE is_active AND last_login_at >= NOW() - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(pool)
        .await
    }
}
