//! Fold an import's rows into the user's master books.

use kdpdesk_core::currency::RateTable;
use kdpdesk_core::kdp::aggregation::{add_source_import, aggregate_by_asin_format, BookAggregate};
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::master_book::UpsertMasterBook;
use kdpdesk_db::repositories::{KdpImportDataRepo, MasterBookRepo};
use serde::Serialize;
use sqlx::PgPool;

use crate::rates::current_rate_table;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MasterBookUpdate {
    pub groups: usize,
    pub created: usize,
    pub updated: usize,
    /// Groups whose master book already includes this import.
    pub skipped: usize,
    pub failed: usize,
}

/// Aggregate the import's stored rows by (ASIN, format) and merge each group
/// into its master book. An import already listed in a master book's
/// sources is not counted twice. A failed group is logged and skipped.
pub async fn update_from_import(
    pool: &PgPool,
    user_id: DbId,
    import_id: DbId,
) -> Result<MasterBookUpdate, sqlx::Error> {
    let records: Vec<_> = KdpImportDataRepo::list_all_by_import(pool, user_id, import_id)
        .await?
        .iter()
        .map(|row| row.to_record())
        .collect();
    let aggregates = aggregate_by_asin_format(&records);
    let rates = current_rate_table(pool).await?;

    let mut result = MasterBookUpdate {
        groups: aggregates.len(),
        ..Default::default()
    };

    for agg in &aggregates {
        match merge_group(pool, user_id, import_id, agg, &rates).await {
            Ok(Merge::Created) => result.created += 1,
            Ok(Merge::Updated) => result.updated += 1,
            Ok(Merge::AlreadyIncluded) => result.skipped += 1,
            Err(e) => {
                tracing::error!(
                    import_id,
                    asin = %agg.asin,
                    format = agg.format.as_str(),
                    error = %e,
                    "Failed to update master book",
                );
                result.failed += 1;
            }
        }
    }

    tracing::info!(
        import_id,
        user_id,
        created = result.created,
        updated = result.updated,
        "Master books updated",
    );
    Ok(result)
}

enum Merge {
    Created,
    Updated,
    AlreadyIncluded,
}

/// Read-merge-write of one group inside a transaction holding the group's
/// advisory lock, so concurrent imports of the same book both count.
async fn merge_group(
    pool: &PgPool,
    user_id: DbId,
    import_id: DbId,
    agg: &BookAggregate,
    rates: &RateTable,
) -> Result<Merge, sqlx::Error> {
    let format = agg.format.as_str();
    let mut tx = pool.begin().await?;
    MasterBookRepo::lock_asin_format(&mut *tx, user_id, &agg.asin, format).await?;
    let existing = MasterBookRepo::find_by_asin_format(&mut *tx, user_id, &agg.asin, format).await?;

    let (totals, source_imports, outcome) = match existing {
        Some(book) if book.source_imports.contains(&import_id) => {
            return Ok(Merge::AlreadyIncluded);
        }
        Some(book) => {
            let mut totals = book.totals();
            totals.merge(&agg.totals);
            let mut sources = book.source_imports.clone();
            add_source_import(&mut sources, import_id);
            (totals, sources, Merge::Updated)
        }
        None => (agg.totals.clone(), vec![import_id], Merge::Created),
    };

    MasterBookRepo::upsert(
        &mut *tx,
        user_id,
        &UpsertMasterBook {
            asin: agg.asin.clone(),
            format: format.to_string(),
            isbn: agg.isbn.clone(),
            title: agg.title.clone(),
            author_name: agg.author_name.clone(),
            total_royalties_usd: totals.total_royalties_usd(rates),
            totals,
            source_imports,
            last_import_id: import_id,
        },
    )
    .await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Recompute every master book's USD total with `rates`. Returns the number
/// of books whose total changed.
pub async fn revalue(pool: &PgPool, user_id: DbId, rates: &RateTable) -> Result<usize, sqlx::Error> {
    let mut changed = 0;
    for book in MasterBookRepo::list(pool, user_id).await? {
        let total = book.totals().total_royalties_usd(rates);
        if (total - book.total_royalties_usd).abs() > f64::EPSILON {
            MasterBookRepo::set_total_royalties_usd(pool, book.id, total).await?;
            changed += 1;
        }
    }
    Ok(changed)
}
