//! Handlers for `/exchange-rates` and `/currencies`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use kdpdesk_core::currency::{normalize_currency_code, round2, CurrencyInfo, MAJOR_CURRENCIES};
use kdpdesk_core::error::CoreError;
use kdpdesk_db::models::audit::CreateAuditLog;
use kdpdesk_db::models::exchange_rate::ExchangeRate;
use kdpdesk_db::repositories::{AuditLogRepo, ExchangeRateRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::middleware::rbac::RequireAdmin;
use crate::rates::{current_rate_table, refresh_rates, RefreshOutcome};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub converted: f64,
}

/// GET /api/v1/exchange-rates
///
/// The most recent stored USD rate per currency.
pub async fn list_rates(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ExchangeRate>>>> {
    let rates = ExchangeRateRepo::latest_usd_rates(&state.pool).await?;
    Ok(Json(DataResponse { data: rates }))
}

/// GET /api/v1/exchange-rates/convert?amount=&from=&to=
pub async fn convert(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<ConvertParams>,
) -> AppResult<Json<Conversion>> {
    if !params.amount.is_finite() {
        return Err(AppError::BadRequest("amount must be a finite number".into()));
    }
    let from = normalize_currency_code(&params.from);
    let to = normalize_currency_code(&params.to);

    let table = current_rate_table(&state.pool).await?;
    let rate = table.cross_rate(&from, &to).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "No exchange rate available for {from} -> {to}"
        )))
    })?;

    Ok(Json(Conversion {
        amount: params.amount,
        converted: round2(params.amount * rate),
        from,
        to,
        rate,
    }))
}

/// POST /api/v1/exchange-rates/update
///
/// Fetch fresh rates now instead of waiting for the background refresh.
pub async fn update_rates(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    client: ClientInfo,
) -> AppResult<(StatusCode, Json<RefreshOutcome>)> {
    let outcome = refresh_rates(&state.pool, state.rate_provider.as_ref()).await?;

    AuditLogRepo::create(
        &state.pool,
        &CreateAuditLog {
            user_id: Some(admin.user_id),
            action: "update_exchange_rates".into(),
            resource: "exchange_rates".into(),
            resource_id: None,
            details: Some(json!({ "stored": outcome.stored, "source": outcome.source })),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        },
    )
    .await?;

    Ok((StatusCode::OK, Json(outcome)))
}

/// GET /api/v1/currencies
pub async fn list_currencies(_auth: AuthUser) -> Json<DataResponse<&'static [CurrencyInfo]>> {
    Json(DataResponse {
        data: MAJOR_CURRENCIES,
    })
}
