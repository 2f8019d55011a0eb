//! Repository for `user_sessions`.

use kdpdesk_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                       user_agent, ip_address, created_at, updated_at";

/// Refresh-token sessions. A session is usable while it is neither revoked
/// nor expired; [`SessionRepo::rotate`] swaps one for its successor.
pub struct SessionRepo;

impl SessionRepo {
    async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateSession,
    ) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(input.user_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(executor)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        Self::insert(pool, input).await
    }

    /// The usable session holding this refresh-token hash.
    pub async fn find_active_by_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE refresh_token_hash = $1 AND is_revoked = false AND expires_at > NOW()"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke session `old_id` and open `next` in one transaction.
    ///
    /// Returns `None`, opening nothing, when `old_id` was already revoked,
    /// so a refresh token can be redeemed once even under concurrent use.
    pub async fn rotate(
        pool: &PgPool,
        old_id: DbId,
        next: &CreateSession,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revoked = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE id = $1 AND is_revoked = false",
        )
        .bind(old_id)
        .execute(&mut *tx)
        .await?;
        if revoked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let session = Self::insert(&mut *tx, next).await?;
        tx.commit().await?;
        Ok(Some(session))
    }

    /// Revoke every usable session of a user (logout, deactivation).
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true
             WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired sessions, and revoked ones untouched for
    /// `revoked_retention_days`.
    pub async fn purge(pool: &PgPool, revoked_retention_days: i32) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions
             WHERE expires_at < NOW()
                OR (is_revoked = true AND updated_at < NOW() - make_interval(days => $1))",
        )
        .bind(revoked_retention_days)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
