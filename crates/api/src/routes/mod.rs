pub mod admin;
pub mod analytics;
pub mod auth;
pub mod authors;
pub mod books;
pub mod currency;
pub mod dashboard;
pub mod health;
pub mod kdp_imports;
pub mod master_books;
pub mod projects;
pub mod sales;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                          register (public)
/// /auth/login                             login (public)
/// /auth/refresh                           refresh (public)
/// /auth/logout                            logout
/// /auth/me                                current user
///
/// /projects                               list, create
/// /projects/{id}                          get, update, delete
/// /projects/{id}/duplicate                duplicate (POST)
///
/// /books                                  list, create
/// /books/check-isbn                       ISBN availability (GET)
/// /books/{id}                             get, update, delete
/// /books/{id}/duplicate                   duplicate (POST)
/// /books/{id}/contributors                list, add
/// /books/{id}/contributors/{cid}          remove (DELETE)
///
/// /authors                                list, create
/// /authors/{id}                           get, update, delete
/// /authors/{id}/books                     books by author (GET)
///
/// /sales-data                             list (GET)
/// /kdp-reports/upload                     simple sales report (POST, multipart)
///
/// /kdp-imports/upload                     start an import (POST, multipart)
/// /kdp-imports                            list (GET)
/// /kdp-imports/{id}                       get, delete
/// /kdp-imports/{id}/data                  stored rows (GET)
/// /kdp-imports/{id}/preview               reconciliation preview (GET)
/// /kdp-imports/{id}/create-books          reconcile into books (POST)
/// /kdp-imports/{id}/estimator-stats       estimator buckets (GET)
///
/// /master-books                           list (GET)
/// /master-books/{asin}                    formats for an ASIN (GET)
/// /master-books/update/{import_id}        fold an import in (POST)
///
/// /analytics/overview                     totals (GET)
/// /analytics/total-revenue                revenue by currency (GET)
/// /analytics/top-performers               books by USD royalty (GET)
/// /analytics/marketplace-breakdown        per marketplace (GET)
/// /analytics/sales-trends                 per month (GET)
/// /analytics/detailed                     raw rows (GET)
/// /analytics/consolidate                  rebuild payments (POST)
/// /analytics/consolidated                 consolidated payments (GET)
///
/// /exchange-rates                         latest rates (GET)
/// /exchange-rates/convert                 convert an amount (GET)
/// /exchange-rates/update                  refresh now (POST, admin only)
/// /currencies                             supported currencies (GET)
///
/// /dashboard/stats                        dashboard summary (GET)
///
/// /admin/stats                            platform totals (admin only)
/// /admin/users                            search users
/// /admin/users/{id}/role                  change role (PUT)
/// /admin/users/{id}/deactivate            deactivate (PUT)
/// /admin/users/{id}/reactivate            reactivate (PUT)
/// /admin/config                           get, update settings
/// /admin/audit-logs                       audit trail (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Registration, login, token refresh, logout, current user.
        .nest("/auth", auth::router())
        // Catalogue.
        .nest("/projects", projects::router())
        .nest("/books", books::router())
        .nest("/authors", authors::router())
        // Simple sales reports.
        .nest("/sales-data", sales::sales_data_router())
        .nest("/kdp-reports", sales::reports_router())
        // KDP ingestion pipeline and its outputs.
        .nest("/kdp-imports", kdp_imports::router())
        .nest("/master-books", master_books::router())
        .nest("/analytics", analytics::router())
        // Currency.
        .nest("/exchange-rates", currency::exchange_rates_router())
        .nest("/currencies", currency::currencies_router())
        // Dashboard.
        .nest("/dashboard", dashboard::router())
        // Administration.
        .nest("/admin", admin::router())
}
