use chrono::{Duration, Utc};
use kdpdesk_db::models::session::CreateSession;
use kdpdesk_db::models::user::CreateUser;
use kdpdesk_db::repositories::{SessionRepo, UserRepo};
use sqlx::PgPool;

async fn writer(pool: &PgPool) -> i64 {
    let input = CreateUser {
        username: "quill".into(),
        email: "Quill@Example.com".into(),
        password_hash: "not-a-real-hash".into(),
        first_name: None,
        last_name: None,
        role: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

fn session(user_id: i64, hash: &str, expires_in: Duration) -> CreateSession {
    CreateSession {
        user_id,
        refresh_token_hash: hash.into(),
        expires_at: Utc::now() + expires_in,
        user_agent: Some("test-agent".into()),
        ip_address: Some("203.0.113.7".into()),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_lookup_by_username_or_email(pool: PgPool) {
    let id = writer(&pool).await;

    let by_name = UserRepo::find_by_login(&pool, "quill").await.unwrap().unwrap();
    assert_eq!(by_name.id, id);
    let by_email = UserRepo::find_by_login(&pool, "quill@example.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, id);
    assert!(UserRepo::find_by_login(&pool, "Quill").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_logins_lock_at_threshold(pool: PgPool) {
    let id = writer(&pool).await;

    for _ in 0..2 {
        assert!(!UserRepo::record_failed_login(&pool, id, 3, 15).await.unwrap());
    }
    assert!(UserRepo::record_failed_login(&pool, id, 3, 15).await.unwrap());

    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 3);
    assert!(user.is_locked(Utc::now()));

    UserRepo::record_successful_login(&pool, id).await.unwrap();
    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(!user.is_locked(Utc::now()));
    assert!(user.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_rotation_redeems_a_session_once(pool: PgPool) {
    let user_id = writer(&pool).await;
    let first = SessionRepo::create(&pool, &session(user_id, "hash-1", Duration::days(7)))
        .await
        .unwrap();
    assert_eq!(first.ip_address.as_deref(), Some("203.0.113.7"));

    let next = session(user_id, "hash-2", Duration::days(7));
    let second = SessionRepo::rotate(&pool, first.id, &next).await.unwrap();
    assert_eq!(second.unwrap().refresh_token_hash, "hash-2");

    // The first session is spent; a second rotation opens nothing.
    let again = session(user_id, "hash-3", Duration::days(7));
    assert!(SessionRepo::rotate(&pool, first.id, &again).await.unwrap().is_none());
    assert!(SessionRepo::find_active_by_token_hash(&pool, "hash-1")
        .await
        .unwrap()
        .is_none());
    assert!(SessionRepo::find_active_by_token_hash(&pool, "hash-3")
        .await
        .unwrap()
        .is_none());
    assert!(SessionRepo::find_active_by_token_hash(&pool, "hash-2")
        .await
        .unwrap()
        .is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_purge_keeps_recently_revoked(pool: PgPool) {
    let user_id = writer(&pool).await;
    SessionRepo::create(&pool, &session(user_id, "expired", Duration::hours(-1)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session(user_id, "live", Duration::days(7)))
        .await
        .unwrap();
    SessionRepo::create(&pool, &session(user_id, "revoked", Duration::days(7)))
        .await
        .unwrap();
    sqlx::query("UPDATE user_sessions SET is_revoked = true WHERE refresh_token_hash = 'revoked'")
        .execute(&pool)
        .await
        .unwrap();

    // Only the expired one goes while the revocation is fresh.
    assert_eq!(SessionRepo::purge(&pool, 7).await.unwrap(), 1);

    // With no retention the revoked one goes too; the live one stays.
    assert_eq!(SessionRepo::purge(&pool, 0).await.unwrap(), 1);
    assert!(SessionRepo::find_active_by_token_hash(&pool, "live")
        .await
        .unwrap()
        .is_some());
}
