//! Consolidate payments imports into per currency and marketplace totals.

use kdpdesk_core::currency::{round2, RateTable, BASE_CURRENCY};
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::consolidated_sales::{ConsolidatedSales, UpsertConsolidatedSales};
use kdpdesk_db::repositories::{ConsolidatedSalesRepo, KdpImportDataRepo};
use sqlx::PgPool;

/// Rebuild the user's `consolidated_sales` rows from their payments data.
/// Groups with no remaining payments rows are removed.
/// Currencies without a known rate are stored with a zero USD total.
pub async fn consolidate(
    pool: &PgPool,
    user_id: DbId,
    rates: &RateTable,
) -> Result<Vec<ConsolidatedSales>, sqlx::Error> {
    let groups = KdpImportDataRepo::payment_groups(pool, user_id).await?;

    let rows: Vec<UpsertConsolidatedSales> = groups
        .into_iter()
        .map(|group| {
            let exchange_rate = rates.cross_rate(&group.currency, BASE_CURRENCY);
            if exchange_rate.is_none() {
                tracing::warn!(user_id, currency = %group.currency, "No exchange rate for currency");
            }
            UpsertConsolidatedSales {
                total_earnings_usd: round2(group.total_earnings * exchange_rate.unwrap_or(0.0)),
                exchange_rate,
                currency: group.currency,
                marketplace: group.marketplace,
                period_start: group.period_start,
                period_end: group.period_end,
                total_earnings: round2(group.total_earnings),
                payment_count: group.payment_count as i32,
                source_imports: group.import_ids,
            }
        })
        .collect();

    let out = ConsolidatedSalesRepo::replace_for_user(pool, user_id, &rows).await?;
    tracing::info!(user_id, groups = out.len(), "Sales consolidated");
    Ok(out)
}
