//! Handlers for the simple sales report: `/sales-data` and `/kdp-reports/upload`.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use kdpdesk_core::kdp::sales_report::parse_sales_report;
use kdpdesk_core::types::Date;
use kdpdesk_db::models::sales_data::{CreateSalesData, SalesData};
use kdpdesk_db::repositories::{BookRepo, SalesDataRepo};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::upload::{parse_workbook, read_upload};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct ReportUploadResponse {
    pub file_name: String,
    pub records_imported: u64,
    /// Rows matched to a catalogue book by ASIN.
    pub matched_books: usize,
}

/// GET /api/v1/sales-data?start_date=&end_date=
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DateRangeParams>,
) -> AppResult<Json<DataResponse<Vec<SalesData>>>> {
    let rows = SalesDataRepo::list(&state.pool, auth.user_id, params.start_date, params.end_date)
        .await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/kdp-reports/upload
///
/// Parse a simple sales report and store its rows synchronously.
pub async fn upload_report(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ReportUploadResponse>)> {
    let file = read_upload(multipart, state.config.max_upload_bytes).await?;
    let workbook = parse_workbook(&file).await?;

    let records = parse_sales_report(&workbook, Utc::now().date_naive())?;

    let mut rows = Vec::with_capacity(records.len());
    let mut matched_books = 0;
    for rec in &records {
        let book = match rec.asin.as_deref() {
            Some(asin) => BookRepo::find_by_asin_or_isbn(&state.pool, auth.user_id, asin).await?,
            None => None,
        };
        if book.is_some() {
            matched_books += 1;
        }
        rows.push(CreateSalesData {
            project_id: book.as_ref().and_then(|b| b.project_id),
            book_id: book.as_ref().map(|b| b.id),
            report_date: rec.report_date,
            format: rec.format.as_str().to_string(),
            marketplace: rec.marketplace.clone(),
            units_sold: rec.units_sold,
            revenue: rec.revenue,
            royalty: rec.royalty,
            file_name: Some(file.file_name.clone()),
        });
    }

    let records_imported = SalesDataRepo::insert_batch(&state.pool, auth.user_id, &rows).await?;
    tracing::info!(
        user_id = auth.user_id,
        file_name = %file.file_name,
        records_imported,
        "Sales report imported",
    );

    Ok((
        StatusCode::CREATED,
        Json(ReportUploadResponse {
            file_name: file.file_name,
            records_imported,
            matched_books,
        }),
    ))
}
