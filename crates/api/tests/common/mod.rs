//! Shared helpers for the API integration tests.
//!
//! Each test file declares `mod common;` and uses only part of this module.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use kdpdesk_api::auth::jwt::{issue_access_token, JwtConfig};
use kdpdesk_api::config::ServerConfig;
use kdpdesk_api::rates::{RateFetchError, RateProvider};
use kdpdesk_api::router::build_app_router;
use kdpdesk_api::state::AppState;
use kdpdesk_core::currency::RateTable;
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::user::CreateUser;
use kdpdesk_db::repositories::UserRepo;
use sqlx::PgPool;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-9";
const MULTIPART_BOUNDARY: &str = "kdpdesk-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        max_upload_bytes: 5 * 1024 * 1024,
        exchange_rate_api_url: "http://127.0.0.1:9/unused".to_string(),
        exchange_rate_refresh_hours: 24,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_ttl_mins: 15,
            refresh_ttl_days: 7,
        },
    }
}

/// Rate provider answering with a fixed table, or failing when empty.
pub struct StubRateProvider(pub RateTable);

#[async_trait]
impl RateProvider for StubRateProvider {
    async fn fetch_usd_rates(&self) -> Result<RateTable, RateFetchError> {
        if self.0.currencies().next().is_none() {
            return Err(RateFetchError::Empty);
        }
        Ok(self.0.clone())
    }
}

/// USD 1, EUR 0.5, GBP 0.8: round numbers so converted totals are exact.
pub fn stub_rates() -> RateTable {
    [("USD", 1.0), ("EUR", 0.5), ("GBP", 0.8)].into_iter().collect()
}

/// The production router over `pool`, with a stubbed rate provider.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        rate_provider: Arc::new(StubRateProvider(stub_rates())),
        import_tasks: TaskTracker::new(),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Insert a user with `role` and return `(id, access token)`.
pub async fn create_user_with_token(pool: &PgPool, username: &str, role: &str) -> (DbId, String) {
    let hashed = kdpdesk_api::auth::password::hash_password(TEST_PASSWORD)
        .expect("hashing should succeed");
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: hashed,
            first_name: None,
            last_name: None,
            role: Some(role.to_string()),
        },
    )
    .await
    .expect("user creation should succeed");
    let token = issue_access_token(user.id, &user.role, &test_config().jwt)
        .expect("token generation should succeed");
    (user.id, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: Option<String>,
    body: Body,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, Body::empty()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, Body::empty()).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, Body::empty()).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        None,
        Some("application/json".into()),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Method::POST,
        uri,
        Some(token),
        Some("application/json".into()),
        Body::from(body.to_string()),
    )
    .await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(
        app,
        Method::PUT,
        uri,
        Some(token),
        Some("application/json".into()),
        Body::from(body.to_string()),
    )
    .await
}

/// POST a single-file multipart form under the `file` field.
pub async fn post_file_auth(
    app: Router,
    uri: &str,
    token: &str,
    file_name: &str,
    bytes: &[u8],
) -> Response<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        Method::POST,
        uri,
        Some(token),
        Some(format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}")),
        Body::from(body),
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// One sale row for [`royalty_workbook`].
pub struct SaleRow<'a> {
    pub date: &'a str,
    pub title: &'a str,
    pub author: &'a str,
    pub asin: &'a str,
    pub marketplace: &'a str,
    pub units: f64,
    pub royalty: f64,
    pub currency: &'a str,
}

/// An XLSX export with a single `eBook Royalty` sheet.
pub fn royalty_workbook(rows: &[SaleRow<'_>]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("eBook Royalty").unwrap();

    let headers = [
        "Royalty Date",
        "Title",
        "Author Name",
        "ASIN",
        "Marketplace",
        "Units Sold",
        "Royalty",
        "Currency",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.date).unwrap();
        sheet.write_string(r, 1, row.title).unwrap();
        sheet.write_string(r, 2, row.author).unwrap();
        sheet.write_string(r, 3, row.asin).unwrap();
        sheet.write_string(r, 4, row.marketplace).unwrap();
        sheet.write_number(r, 5, row.units).unwrap();
        sheet.write_number(r, 6, row.royalty).unwrap();
        sheet.write_string(r, 7, row.currency).unwrap();
    }

    workbook.save_to_buffer().unwrap()
}

/// Royalties Estimator columns, shared by the summary and per-format sheets.
const ESTIMATOR_HEADERS: [&str; 11] = [
    "Royalty Date",
    "Title",
    "Author Name",
    "ASIN/ISBN",
    "Marketplace",
    "Royalty Type",
    "Transaction Type",
    "Units Sold",
    "Net Units Sold",
    "Royalty",
    "Currency",
];

/// An estimator export: each `(sheet, row)` lands on its per-format sheet
/// and is repeated on `Combined Sales`, as KDP does. `asin` may be an ISBN.
pub fn estimator_workbook(rows: &[(&str, SaleRow<'_>)]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let mut sheets: Vec<(&str, Vec<&SaleRow<'_>>)> =
        vec![("Combined Sales", rows.iter().map(|(_, r)| r).collect())];
    for name in ["eBook Royalty", "Paperback Royalty"] {
        let on_sheet = rows.iter().filter(|(s, _)| *s == name).map(|(_, r)| r);
        sheets.push((name, on_sheet.collect()));
    }

    for (name, sheet_rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).unwrap();
        for (col, header) in ESTIMATOR_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (i, row) in sheet_rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, row.date).unwrap();
            sheet.write_string(r, 1, row.title).unwrap();
            sheet.write_string(r, 2, row.author).unwrap();
            sheet.write_string(r, 3, row.asin).unwrap();
            sheet.write_string(r, 4, row.marketplace).unwrap();
            sheet.write_string(r, 5, "70%").unwrap();
            sheet.write_number(r, 7, row.units).unwrap();
            sheet.write_number(r, 8, row.units).unwrap();
            sheet.write_number(r, 9, row.royalty).unwrap();
            sheet.write_string(r, 10, row.currency).unwrap();
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Poll an import until it leaves `pending` / `processing`.
pub async fn wait_for_import(app: &Router, token: &str, import_id: i64) -> serde_json::Value {
    for _ in 0..100 {
        let response = get_auth(app.clone(), &format!("/api/v1/kdp-imports/{import_id}"), token).await;
        let json = body_json(response).await;
        if json["status"] != "pending" && json["status"] != "processing" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("import {import_id} did not finish in time");
}
