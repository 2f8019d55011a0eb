//! Accounts and the shapes they are exposed in.

use kdpdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `users` row. Carries the password hash, so it is never serialized;
/// handlers answer with [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// First and last name when either is set, else the username.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `user` when `None`.
    pub role: Option<String>,
}

/// `?search=&limit=&offset=` of the admin user list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearch {
    /// Case-insensitive substring of username, email or either name.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(first: Option<&str>, last: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: 1,
            username: "inkwell".into(),
            email: "ink@example.com".into(),
            password_hash: "$argon2id$...".into(),
            first_name: first.map(Into::into),
            last_name: last.map(Into::into),
            role: "user".into(),
            is_active: true,
            last_login_at: None,
            failed_login_count: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn display_name_prefers_real_names() {
        assert_eq!(user(Some("Ada"), Some("Byron")).display_name(), "Ada Byron");
        assert_eq!(user(None, Some("Byron")).display_name(), "Byron");
        assert_eq!(user(Some("  "), None).display_name(), "inkwell");
    }

    #[test]
    fn lock_expires() {
        let now = Utc::now();
        let mut u = user(None, None);
        assert!(!u.is_locked(now));
        u.locked_until = Some(now + Duration::minutes(5));
        assert!(u.is_locked(now));
        assert!(!u.is_locked(now + Duration::minutes(6)));
    }
}
