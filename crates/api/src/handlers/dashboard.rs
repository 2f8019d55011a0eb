//! Handler for the dashboard summary.

use axum::extract::State;
use axum::Json;
use chrono::{Days, Months, Utc};
use kdpdesk_core::currency::round2;
use kdpdesk_core::dashboard::{format_distribution, FormatShare};
use kdpdesk_core::validation::PROJECT_PUBLISHED;
use kdpdesk_db::models::sales_data::MonthlyRevenue;
use kdpdesk_db::repositories::{BookRepo, ProjectRepo, SalesDataRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Window for `revenue_last_30_days`.
const RECENT_REVENUE_DAYS: u64 = 30;
/// Months covered by `monthly_revenue`.
const REVENUE_CHART_MONTHS: u32 = 6;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_books: i64,
    pub published_projects: i64,
    pub revenue_last_30_days: f64,
    pub total_units_sold: i64,
    pub monthly_revenue: Vec<MonthlyRevenue>,
    pub format_distribution: Vec<FormatShare>,
}

/// GET /api/v1/dashboard/stats
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<DashboardStats>> {
    let today = Utc::now().date_naive();
    let recent_since = today - Days::new(RECENT_REVENUE_DAYS);
    let chart_since = today
        .checked_sub_months(Months::new(REVENUE_CHART_MONTHS))
        .unwrap_or(recent_since);

    let total_books = BookRepo::count_for_user(&state.pool, auth.user_id).await?;
    let published_projects =
        ProjectRepo::count_by_status(&state.pool, auth.user_id, PROJECT_PUBLISHED).await?;
    let revenue = SalesDataRepo::revenue_since(&state.pool, auth.user_id, recent_since).await?;
    let total_units_sold = SalesDataRepo::total_units(&state.pool, auth.user_id).await?;
    let monthly_revenue = SalesDataRepo::monthly_revenue(&state.pool, auth.user_id, chart_since).await?;

    let units: Vec<(String, i64)> = SalesDataRepo::units_by_format(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .map(|f| (f.format, f.units))
        .collect();

    Ok(Json(DashboardStats {
        total_books,
        published_projects,
        revenue_last_30_days: round2(revenue),
        total_units_sold,
        monthly_revenue,
        format_distribution: format_distribution(&units),
    }))
}
