//! HTTP-level tests for registration, login, refresh and logout.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json, post_json_auth, TEST_PASSWORD};
use serde_json::json;
use sqlx::PgPool;

async fn register(app: axum::Router, username: &str) -> serde_json::Value {
    let body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": TEST_PASSWORD,
    });
    let response = post_json(app, "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_signs_the_user_in(pool: PgPool) {
    let json = register(common::build_test_app(pool), "writer").await;

    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["user"]["username"], "writer");
    assert_eq!(json["user"]["role"], "user");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_is_a_conflict(pool: PgPool) {
    register(common::build_test_app(pool.clone()), "writer").await;

    let body = json!({
        "username": "writer",
        "email": "other@example.com",
        "password": TEST_PASSWORD,
    });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn weak_password_is_rejected(pool: PgPool) {
    let body = json!({ "username": "writer", "email": "w@example.com", "password": "short" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_by_username_or_email(pool: PgPool) {
    register(common::build_test_app(pool.clone()), "writer").await;

    for login in ["writer", "writer@example.com"] {
        let body = json!({ "username": login, "password": TEST_PASSWORD });
        let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::OK, "login as {login}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_is_unauthorized(pool: PgPool) {
    register(common::build_test_app(pool.clone()), "writer").await;

    let body = json!({ "username": "writer", "password": "not-the-password" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_locks_after_repeated_failures(pool: PgPool) {
    register(common::build_test_app(pool.clone()), "writer").await;

    for _ in 0..5 {
        let body = json!({ "username": "writer", "password": "nope-nope-nope" });
        post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
    }

    // Even the right password is refused while locked.
    let body = json!({ "username": "writer", "password": TEST_PASSWORD });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_the_token(pool: PgPool) {
    let session = register(common::build_test_app(pool.clone()), "writer").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let response = post_json(
        common::build_test_app(pool.clone()),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"].as_str().unwrap(), refresh_token);

    // The old token was revoked by the rotation.
    let response = post_json(
        common::build_test_app(pool),
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh_token }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_returns_the_caller(pool: PgPool) {
    let session = register(common::build_test_app(pool.clone()), "writer").await;
    let token = session["access_token"].as_str().unwrap();

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/auth/me", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], "writer");
    assert!(json.get("password_hash").is_none());

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/auth/logout",
        token,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_records_client_details(pool: PgPool) {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    register(common::build_test_app(pool.clone()), "writer").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .header("user-agent", "kdpdesk-dashboard/1.0")
        .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
        .body(Body::from(
            json!({ "username": "writer", "password": TEST_PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = common::build_test_app(pool.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (agent, ip): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT user_agent, ip_address FROM user_sessions ORDER BY id DESC LIMIT 1",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(agent.as_deref(), Some("kdpdesk-dashboard/1.0"));
    assert_eq!(ip.as_deref(), Some("198.51.100.4"));
}
