//! Handlers for `/analytics`: reporting over imported KDP data.
//!
//! Stored figures stay in their original currency; USD totals are computed
//! per request from the latest exchange rates.

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Months, Utc};
use kdpdesk_core::currency::{round2, RateTable};
use kdpdesk_core::types::Date;
use kdpdesk_db::models::consolidated_sales::ConsolidatedSales;
use kdpdesk_db::models::kdp_import_data::{ImportDataOverview, KdpImportData};
use kdpdesk_db::repositories::{ConsolidatedSalesRepo, KdpImportDataRepo, MasterBookRepo};
use serde::{Deserialize, Serialize};

use crate::engine::{consolidation, master_books};
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::rates::current_rate_table;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_TOP_PERFORMERS: usize = 10;
const DEFAULT_TREND_MONTHS: u32 = 12;
const DEFAULT_DETAILED_LIMIT: i64 = 1000;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct TopPerformersParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendParams {
    pub months: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DetailedParams {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CurrencyRevenue {
    pub currency: String,
    pub total_royalty: f64,
    /// `None` when no rate is known for the currency.
    pub total_royalty_usd: Option<f64>,
    pub record_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TotalRevenue {
    pub total_royalty_usd: f64,
    pub by_currency: Vec<CurrencyRevenue>,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    #[serde(flatten)]
    pub totals: ImportDataOverview,
    pub total_royalty_usd: f64,
    pub master_books: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookRanking {
    pub asin: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub units_sold: i64,
    pub kenp_read: i64,
    pub total_royalty_usd: f64,
}

#[derive(Debug, Serialize)]
pub struct MarketplaceRevenue {
    pub marketplace: String,
    pub units_sold: i64,
    pub record_count: i64,
    pub total_royalty_usd: f64,
    pub royalties_by_currency: BTreeMap<String, f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct MonthRevenue {
    pub month: String,
    pub units_sold: i64,
    pub kenp_read: i64,
    pub total_royalty_usd: f64,
}

#[derive(Debug, Serialize)]
pub struct ConsolidatedOverview {
    pub total_earnings_usd: f64,
    pub data: Vec<ConsolidatedSales>,
}

#[derive(Debug, Serialize)]
pub struct ConsolidateResponse {
    pub groups: usize,
    pub total_earnings_usd: f64,
    pub master_books_revalued: usize,
}

fn usd(rates: &RateTable, amount: f64, currency: &str) -> f64 {
    rates.to_usd(amount, currency).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/analytics/overview
pub async fn overview(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<Overview>> {
    let totals = KdpImportDataRepo::overview(&state.pool, auth.user_id).await?;
    let currencies = KdpImportDataRepo::currency_totals(&state.pool, auth.user_id).await?;
    let master_books = MasterBookRepo::list(&state.pool, auth.user_id).await?.len();
    let rates = current_rate_table(&state.pool).await?;

    let total_royalty_usd = currencies
        .iter()
        .map(|c| usd(&rates, c.total_royalty, &c.currency))
        .sum();

    Ok(Json(Overview {
        totals,
        total_royalty_usd: round2(total_royalty_usd),
        master_books,
    }))
}

/// GET /api/v1/analytics/total-revenue
pub async fn total_revenue(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<TotalRevenue>> {
    let currencies = KdpImportDataRepo::currency_totals(&state.pool, auth.user_id).await?;
    let rates = current_rate_table(&state.pool).await?;

    let by_currency: Vec<CurrencyRevenue> = currencies
        .into_iter()
        .map(|c| CurrencyRevenue {
            total_royalty_usd: rates.to_usd(c.total_royalty, &c.currency).map(round2),
            total_royalty: round2(c.total_royalty),
            currency: c.currency,
            record_count: c.record_count,
        })
        .collect();
    let total = by_currency.iter().filter_map(|c| c.total_royalty_usd).sum();

    Ok(Json(TotalRevenue {
        total_royalty_usd: round2(total),
        by_currency,
    }))
}

/// GET /api/v1/analytics/top-performers?limit=
///
/// Books ranked by USD royalty across all currencies.
pub async fn top_performers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<TopPerformersParams>,
) -> AppResult<Json<DataResponse<Vec<BookRanking>>>> {
    let rows = KdpImportDataRepo::book_performance(&state.pool, auth.user_id).await?;
    let rates = current_rate_table(&state.pool).await?;

    let mut books: BTreeMap<(Option<String>, Option<String>), BookRanking> = BTreeMap::new();
    for row in rows {
        let entry = books
            .entry((row.asin.clone(), row.isbn.clone()))
            .or_insert_with(|| BookRanking {
                asin: row.asin.clone(),
                isbn: row.isbn.clone(),
                title: row.title.clone(),
                units_sold: 0,
                kenp_read: 0,
                total_royalty_usd: 0.0,
            });
        if entry.title.is_none() {
            entry.title = row.title.clone();
        }
        entry.units_sold += row.units_sold;
        entry.kenp_read += row.kenp_read;
        entry.total_royalty_usd += usd(&rates, row.total_royalty, &row.currency);
    }

    let mut ranked: Vec<BookRanking> = books.into_values().collect();
    ranked.sort_by(|a, b| b.total_royalty_usd.total_cmp(&a.total_royalty_usd));
    ranked.truncate(params.limit.unwrap_or(DEFAULT_TOP_PERFORMERS));
    for book in &mut ranked {
        book.total_royalty_usd = round2(book.total_royalty_usd);
    }

    Ok(Json(DataResponse { data: ranked }))
}

/// GET /api/v1/analytics/marketplace-breakdown
pub async fn marketplace_breakdown(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<MarketplaceRevenue>>>> {
    let rows = KdpImportDataRepo::marketplace_performance(&state.pool, auth.user_id).await?;
    let rates = current_rate_table(&state.pool).await?;

    let mut markets: BTreeMap<String, MarketplaceRevenue> = BTreeMap::new();
    for row in rows {
        let entry = markets
            .entry(row.marketplace.clone())
            .or_insert_with(|| MarketplaceRevenue {
                marketplace: row.marketplace.clone(),
                units_sold: 0,
                record_count: 0,
                total_royalty_usd: 0.0,
                royalties_by_currency: BTreeMap::new(),
            });
        entry.units_sold += row.units_sold;
        entry.record_count += row.record_count;
        entry.total_royalty_usd += usd(&rates, row.total_royalty, &row.currency);
        *entry
            .royalties_by_currency
            .entry(row.currency.clone())
            .or_insert(0.0) += row.total_royalty;
    }

    let mut data: Vec<MarketplaceRevenue> = markets.into_values().collect();
    data.sort_by(|a, b| b.total_royalty_usd.total_cmp(&a.total_royalty_usd));
    for m in &mut data {
        m.total_royalty_usd = round2(m.total_royalty_usd);
    }
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/analytics/sales-trends?months=
///
/// Monthly totals for the last `months` months (default 12), oldest first.
pub async fn sales_trends(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<TrendParams>,
) -> AppResult<Json<DataResponse<Vec<MonthRevenue>>>> {
    let months = params.months.unwrap_or(DEFAULT_TREND_MONTHS).max(1);
    let since = Utc::now().date_naive().checked_sub_months(Months::new(months));
    let rows = KdpImportDataRepo::monthly_trends(&state.pool, auth.user_id, since).await?;
    let rates = current_rate_table(&state.pool).await?;

    let mut by_month: BTreeMap<String, MonthRevenue> = BTreeMap::new();
    for row in rows {
        let entry = by_month.entry(row.month.clone()).or_insert_with(|| MonthRevenue {
            month: row.month.clone(),
            ..Default::default()
        });
        entry.units_sold += row.units_sold;
        entry.kenp_read += row.kenp_read;
        entry.total_royalty_usd += usd(&rates, row.total_royalty, &row.currency);
    }

    let data = by_month
        .into_values()
        .map(|mut m| {
            m.total_royalty_usd = round2(m.total_royalty_usd);
            m
        })
        .collect();
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/analytics/detailed?start_date=&end_date=&limit=
pub async fn detailed(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DetailedParams>,
) -> AppResult<Json<DataResponse<Vec<KdpImportData>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_DETAILED_LIMIT).clamp(1, DEFAULT_DETAILED_LIMIT);
    let rows = KdpImportDataRepo::list_for_user_non_duplicate(
        &state.pool,
        auth.user_id,
        params.start_date,
        params.end_date,
        limit,
    )
    .await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/analytics/consolidate
///
/// Rebuild consolidated payments and refresh master-book USD totals with
/// the current rates.
pub async fn consolidate(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ConsolidateResponse>> {
    let rates = current_rate_table(&state.pool).await?;
    let rows = consolidation::consolidate(&state.pool, auth.user_id, &rates).await?;
    let master_books_revalued = master_books::revalue(&state.pool, auth.user_id, &rates).await?;

    Ok(Json(ConsolidateResponse {
        groups: rows.len(),
        total_earnings_usd: round2(rows.iter().map(|r| r.total_earnings_usd).sum()),
        master_books_revalued,
    }))
}

/// GET /api/v1/analytics/consolidated
pub async fn consolidated(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<ConsolidatedOverview>> {
    let data = ConsolidatedSalesRepo::list(&state.pool, auth.user_id).await?;
    let total = ConsolidatedSalesRepo::total_usd(&state.pool, auth.user_id).await?;
    Ok(Json(ConsolidatedOverview {
        total_earnings_usd: round2(total),
        data,
    }))
}
