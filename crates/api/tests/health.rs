//! Health probe and cross-cutting HTTP behaviour: request ids, CORS, 404s.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, post_json_auth};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_database_and_rates(pool: PgPool) {
    let response = get(common::build_test_app(pool.clone()), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"]["reachable"], true);
    assert!(json["version"].is_string());
    assert!(json["rates_as_of"].is_null());

    let (_, admin) = common::create_user_with_token(&pool, "boss", "admin").await;
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/exchange-rates/update",
        &admin,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(common::build_test_app(pool), "/health").await).await;
    assert_eq!(
        json["rates_as_of"],
        chrono::Utc::now().date_naive().to_string()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_route_is_404(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn request_id_is_generated_or_echoed(pool: PgPool) {
    let response = get(common::build_test_app(pool.clone()), "/health").await;
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me-123")
        .body(Body::empty())
        .unwrap();
    let response = common::build_test_app(pool).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me-123");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cors_preflight_allows_the_dashboard_origin(pool: PgPool) {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/books")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .body(Body::empty())
        .unwrap();
    let response = common::build_test_app(pool).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn api_routes_need_a_bearer_token(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/books").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}
