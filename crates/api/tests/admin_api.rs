//! HTTP-level tests for the admin surface and the manual rate refresh.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json, post_json_auth, put_json_auth, TEST_PASSWORD};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_routes_require_an_admin(pool: PgPool) {
    let (_, user) = common::create_user_with_token(&pool, "writer", "user").await;
    let (_, admin) = common::create_user_with_token(&pool, "boss", "admin").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.clone(), "/api/v1/admin/stats", &user).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app, "/api/v1/admin/stats", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = body_json(response).await;
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_books"], 0);
    assert!(stats["users_by_role"].as_array().unwrap().len() >= 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_users_and_change_role(pool: PgPool) {
    let (writer_id, _) = common::create_user_with_token(&pool, "writer", "user").await;
    common::create_user_with_token(&pool, "editor", "user").await;
    let (_, admin) = common::create_user_with_token(&pool, "boss", "admin").await;
    let app = common::build_test_app(pool);

    let page = body_json(get_auth(app.clone(), "/api/v1/admin/users?search=WRIT", &admin).await).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["username"], "writer");
    assert!(page["data"][0].get("password_hash").is_none());

    let uri = format!("/api/v1/admin/users/{writer_id}/role");
    let response = put_json_auth(app.clone(), &uri, &admin, json!({ "role": "wizard" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Granting superadmin needs a superadmin.
    let response = put_json_auth(app.clone(), &uri, &admin, json!({ "role": "superadmin" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(app.clone(), &uri, &admin, json!({ "role": "admin" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["role"], "admin");

    let logs = body_json(get_auth(app, "/api/v1/admin/audit-logs?action=update_role", &admin).await).await;
    let logs = logs["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["resource_id"], writer_id.to_string());
    assert_eq!(logs[0]["details"]["from"], "user");
    assert_eq!(logs[0]["details"]["to"], "admin");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivation_blocks_login_until_reactivated(pool: PgPool) {
    let (writer_id, _) = common::create_user_with_token(&pool, "writer", "user").await;
    let (admin_id, admin) = common::create_user_with_token(&pool, "boss", "admin").await;
    let app = common::build_test_app(pool);
    let credentials = json!({ "username": "writer", "password": TEST_PASSWORD });

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/admin/users/{admin_id}/deactivate"),
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/admin/users/{writer_id}/deactivate"),
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["is_active"], false);

    let response = post_json(app.clone(), "/api/v1/auth/login", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/admin/users/{writer_id}/reactivate"),
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(app, "/api/v1/auth/login", credentials).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn system_config_round_trip(pool: PgPool) {
    let (admin_id, admin) = common::create_user_with_token(&pool, "boss", "admin").await;
    let app = common::build_test_app(pool);

    let response = put_json_auth(
        app.clone(),
        "/api/v1/admin/config",
        &admin,
        json!({ "settings": [{ "key": "maintenance_mode", "value": "off", "description": null }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        app.clone(),
        "/api/v1/admin/config",
        &admin,
        json!({ "settings": [{ "key": "  ", "value": "x", "description": null }] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let config = body_json(get_auth(app.clone(), "/api/v1/admin/config", &admin).await).await;
    let entry = config["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["key"] == "maintenance_mode")
        .cloned()
        .expect("setting should be stored");
    assert_eq!(entry["value"], "off");
    assert_eq!(entry["updated_by"], admin_id);

    let logs = body_json(get_auth(app, "/api/v1/admin/audit-logs?resource=system_config", &admin).await).await;
    assert_eq!(logs["data"][0]["details"]["keys"], json!(["maintenance_mode"]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manual_rate_refresh_is_admin_only(pool: PgPool) {
    let (_, user) = common::create_user_with_token(&pool, "writer", "user").await;
    let (_, admin) = common::create_user_with_token(&pool, "boss", "admin").await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(app.clone(), "/api/v1/exchange-rates/update", &user, json!({})).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(app.clone(), "/api/v1/exchange-rates/update", &admin, json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["source"], "api");
    assert!(outcome["stored"].as_u64().unwrap() > 0);

    let rates = body_json(get_auth(app, "/api/v1/exchange-rates", &user).await).await;
    let eur = rates["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["to_currency"] == "EUR")
        .cloned()
        .expect("EUR rate should be stored");
    assert_eq!(eur["rate"], 0.5);
}
