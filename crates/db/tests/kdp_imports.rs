//! Integration tests for the ingestion tables: imports, import data,
//! estimator rows, master books, consolidation and exchange rates.

use chrono::NaiveDate;
use kdpdesk_core::currency::RateTable;
use kdpdesk_core::format::BookFormat;
use kdpdesk_core::kdp::aggregation::aggregate_by_asin_format;
use kdpdesk_core::kdp::dedup::{duplicate_key, find_duplicates};
use kdpdesk_core::kdp::estimator::EstimatorRecord;
use kdpdesk_core::kdp::record::NormalizedRecord;
use kdpdesk_core::types::DbId;
use kdpdesk_db::models::consolidated_sales::UpsertConsolidatedSales;
use kdpdesk_db::models::kdp_import::{CreateKdpImport, ImportCompletion};
use kdpdesk_db::models::master_book::UpsertMasterBook;
use kdpdesk_db::models::user::CreateUser;
use kdpdesk_db::repositories::{
    ConsolidatedSalesRepo, EstimatorDataRepo, ExchangeRateRepo, KdpImportDataRepo,
    KdpImportRepo, MasterBookRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str) -> DbId {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "not-a-real-hash".to_string(),
        first_name: None,
        last_name: None,
        role: None,
    };
    UserRepo::create(pool, &input).await.unwrap().id
}

async fn new_import(pool: &PgPool, user_id: DbId, detected_type: &str) -> DbId {
    let input = CreateKdpImport {
        file_name: "report.xlsx".into(),
        file_size: 2048,
        detected_type: detected_type.into(),
        total_records: 3,
        summary: serde_json::json!({ "total_sheets": 1 }),
    };
    KdpImportRepo::create(pool, user_id, &input).await.unwrap().id
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sale(asin: &str, day: u32, royalty: f64, currency: &str) -> NormalizedRecord {
    NormalizedRecord {
        sheet_name: "eBook Royalty".into(),
        row_index: day as i32 + 1,
        asin: Some(asin.into()),
        title: Some("Tide".into()),
        author_name: Some("Ada Quill".into()),
        marketplace: Some("Amazon.com".into()),
        sales_date: Some(date(2025, 1, day)),
        format: Some(BookFormat::Ebook),
        units_sold: Some(2),
        royalty: Some(royalty),
        currency: Some(currency.into()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Import lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_import_lifecycle(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let id = new_import(&pool, user, "payments").await;

    let import = KdpImportRepo::find_by_id(&pool, user, id).await.unwrap().unwrap();
    assert_eq!(import.status, "pending");
    assert_eq!(import.progress, 0);

    KdpImportRepo::mark_processing(&pool, id).await.unwrap();
    KdpImportRepo::update_progress(&pool, id, 40, "Processing sheet: Sheet1", 1)
        .await
        .unwrap();
    // Progress never moves backwards.
    KdpImportRepo::update_progress(&pool, id, 10, "Processing sheet: Sheet2", 2)
        .await
        .unwrap();
    let import = KdpImportRepo::find_by_id(&pool, user, id).await.unwrap().unwrap();
    assert_eq!(import.status, "processing");
    assert_eq!(import.progress, 40);
    assert_eq!(import.current_step.as_deref(), Some("Processing sheet: Sheet2"));

    let completion = ImportCompletion {
        processed_records: 2,
        error_records: 1,
        duplicate_records: 0,
        error_log: vec!["Sheet1 row 4: bad date".into()],
        summary: serde_json::json!({ "warnings": [] }),
        mapping_config: serde_json::json!({ "Sheet1": { "Title": "title" } }),
    };
    KdpImportRepo::complete(&pool, id, &completion).await.unwrap();
    let import = KdpImportRepo::find_by_id(&pool, user, id).await.unwrap().unwrap();
    assert_eq!(import.status, "completed");
    assert_eq!(import.progress, 100);
    assert_eq!(import.error_log.len(), 1);
    assert!(import.completed_at.is_some());

    assert_eq!(
        KdpImportRepo::list_completed_ids_by_type(&pool, user, "payments")
            .await
            .unwrap(),
        vec![id]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_import_keeps_message(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let id = new_import(&pool, user, "unknown").await;
    KdpImportRepo::fail(&pool, id, "workbook is empty").await.unwrap();

    let import = KdpImportRepo::find_by_id(&pool, user, id).await.unwrap().unwrap();
    assert_eq!(import.status, "failed");
    assert_eq!(import.error_log, vec!["workbook is empty".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_interrupted_imports_are_failed(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let pending = new_import(&pool, user, "payments").await;
    let processing = new_import(&pool, user, "payments").await;
    KdpImportRepo::mark_processing(&pool, processing).await.unwrap();
    let done = new_import(&pool, user, "payments").await;
    KdpImportRepo::complete(
        &pool,
        done,
        &ImportCompletion {
            processed_records: 1,
            error_records: 0,
            duplicate_records: 0,
            error_log: vec![],
            summary: serde_json::json!({}),
            mapping_config: serde_json::json!({}),
        },
    )
    .await
    .unwrap();

    let failed = KdpImportRepo::fail_interrupted(&pool, "server restarted").await.unwrap();
    assert_eq!(failed, 2);

    for id in [pending, processing] {
        let import = KdpImportRepo::find_by_id(&pool, user, id).await.unwrap().unwrap();
        assert_eq!(import.status, "failed");
        assert_eq!(import.error_log, vec!["server restarted".to_string()]);
        assert!(import.completed_at.is_some());
    }
    let import = KdpImportRepo::find_by_id(&pool, user, done).await.unwrap().unwrap();
    assert_eq!(import.status, "completed");

    assert_eq!(KdpImportRepo::fail_interrupted(&pool, "again").await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_import_cascades_data(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let id = new_import(&pool, user, "payments").await;
    KdpImportDataRepo::insert_batch(&pool, id, user, &[sale("B0TIDE0001", 5, 1.5, "USD")])
        .await
        .unwrap();
    assert_eq!(KdpImportDataRepo::count_by_import(&pool, user, id).await.unwrap(), 1);

    let stranger = new_user(&pool, "stranger").await;
    assert!(!KdpImportRepo::delete(&pool, stranger, id).await.unwrap());
    assert!(KdpImportRepo::delete(&pool, user, id).await.unwrap());
    assert_eq!(KdpImportDataRepo::count_by_import(&pool, user, id).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Import data
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stored_rows_round_trip_to_duplicate_keys(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let first = new_import(&pool, user, "royalties_estimator").await;
    let records = vec![
        sale("B0TIDE0001", 5, 1.75, "USD"),
        sale("B0TIDE0001", 6, 0.1, "EUR"),
    ];
    KdpImportDataRepo::insert_batch(&pool, first, user, &records).await.unwrap();

    let keys = KdpImportDataRepo::duplicate_keys_for_user(&pool, user).await.unwrap();
    for rec in &records {
        assert!(keys.contains(&duplicate_key(rec).unwrap()));
    }

    let next = vec![sale("B0TIDE0001", 6, 0.1, "EUR"), sale("B0TIDE0001", 7, 2.0, "USD")];
    assert_eq!(find_duplicates(&keys, &next), vec![0]);

    let other = new_user(&pool, "grace").await;
    assert!(KdpImportDataRepo::duplicate_keys_for_user(&pool, other)
        .await
        .unwrap()
        .is_empty());

    let stored = KdpImportDataRepo::list_all_by_import(&pool, user, first).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].to_record().format, Some(BookFormat::Ebook));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_analytics_over_import_data(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let id = new_import(&pool, user, "payments").await;
    let mut uk = sale("B0TIDE0002", 9, 3.0, "GBP");
    uk.marketplace = Some("Amazon.co.uk".into());
    let records = vec![
        sale("B0TIDE0001", 5, 1.5, "USD"),
        sale("B0TIDE0001", 6, 2.5, "USD"),
        uk,
    ];
    KdpImportDataRepo::insert_batch(&pool, id, user, &records).await.unwrap();

    let overview = KdpImportDataRepo::overview(&pool, user).await.unwrap();
    assert_eq!(overview.total_records, 3);
    assert_eq!(overview.unique_books, 2);
    assert_eq!(overview.total_units_sold, 6);
    assert_eq!(overview.marketplaces, 2);
    assert_eq!(overview.first_sale_date, Some(date(2025, 1, 5)));

    let mut totals = KdpImportDataRepo::currency_totals(&pool, user).await.unwrap();
    totals.sort_by(|a, b| a.currency.cmp(&b.currency));
    assert_eq!(totals.len(), 2);
    assert_eq!(totals[1].currency, "USD");
    assert!((totals[1].total_royalty - 4.0).abs() < 1e-9);

    let trends = KdpImportDataRepo::monthly_trends(&pool, user, None).await.unwrap();
    assert!(trends.iter().all(|t| t.month == "2025-01"));

    let groups = KdpImportDataRepo::payment_groups(&pool, user).await.unwrap();
    assert_eq!(groups.len(), 2);
    let usd = groups.iter().find(|g| g.currency == "USD").unwrap();
    assert_eq!(usd.payment_count, 2);
    assert_eq!(usd.import_ids, vec![id]);
    assert_eq!(usd.period_end, Some(date(2025, 1, 6)));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_estimator_rows_and_stats(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let id = new_import(&pool, user, "royalties_estimator").await;
    let rec = EstimatorRecord {
        sheet_name: "eBook Royalty".into(),
        row_index: 2,
        asin: Some("B0TIDE0001".into()),
        title: Some("Tide".into()),
        royalty: Some(9.5),
        currency: Some("EUR".into()),
        raw_data: serde_json::json!([]),
        ..Default::default()
    };
    let promo = EstimatorRecord {
        transaction_type: Some("Free - Promotion".into()),
        royalty: Some(0.0),
        row_index: 3,
        ..rec.clone()
    };
    let inserted = EstimatorDataRepo::insert_batch(
        &pool,
        id,
        user,
        &[(rec, Some(10.0)), (promo, Some(0.0))],
    )
    .await
    .unwrap();
    assert_eq!(inserted, 2);

    let rows = EstimatorDataRepo::list_by_import(&pool, user, id, 50, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].royalty_usd, Some(10.0));

    let stats = EstimatorDataRepo::stats(&pool, user, id).await.unwrap();
    let total: f64 = stats.iter().map(|b| b.total_royalty_usd).sum();
    assert!((total - 10.0).abs() < 1e-9);
    assert_eq!(stats.iter().map(|b| b.record_count).sum::<i64>(), 2);
}

// ---------------------------------------------------------------------------
// Master books
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_master_book_upsert_merges_across_imports(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let rates = RateTable::fallback();

    let first = new_import(&pool, user, "royalties_estimator").await;
    let agg = aggregate_by_asin_format(&[sale("B0TIDE0001", 5, 2.0, "USD")]).remove(0);
    let stored = MasterBookRepo::upsert(
        &pool,
        user,
        &UpsertMasterBook {
            asin: agg.asin.clone(),
            format: agg.format.as_str().to_string(),
            isbn: agg.isbn.clone(),
            title: agg.title.clone(),
            author_name: agg.author_name.clone(),
            total_royalties_usd: agg.totals.total_royalties_usd(&rates),
            totals: agg.totals.clone(),
            source_imports: vec![first],
            last_import_id: first,
        },
    )
    .await
    .unwrap();
    assert_eq!(stored.total_units_sold, 2);

    let second = new_import(&pool, user, "royalties_estimator").await;
    let newer = aggregate_by_asin_format(&[sale("B0TIDE0001", 9, 9.5, "EUR")]).remove(0);
    let mut totals = stored.totals();
    totals.merge(&newer.totals);
    let merged = MasterBookRepo::upsert(
        &pool,
        user,
        &UpsertMasterBook {
            asin: newer.asin.clone(),
            format: newer.format.as_str().to_string(),
            isbn: None,
            title: None,
            author_name: None,
            total_royalties_usd: totals.total_royalties_usd(&rates),
            totals,
            source_imports: vec![first, second],
            last_import_id: second,
        },
    )
    .await
    .unwrap();

    assert_eq!(merged.id, stored.id);
    assert_eq!(merged.total_units_sold, 4);
    assert_eq!(merged.title.as_deref(), Some("Tide"));
    assert_eq!(merged.last_sale_date, Some(date(2025, 1, 9)));
    assert!((merged.total_royalties_usd - 12.0).abs() < 1e-9);
    assert_eq!(merged.source_imports, vec![first, second]);

    let round_trip = merged.totals();
    assert_eq!(round_trip.royalties_by_currency.len(), 2);
    assert_eq!(round_trip.marketplace_breakdown["Amazon.com"].units_sold, 4);

    let found = MasterBookRepo::find_by_asin_format(&pool, user, "B0TIDE0001", "ebook")
        .await
        .unwrap();
    assert!(found.is_some());
    assert_eq!(MasterBookRepo::list(&pool, user).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Consolidation and exchange rates
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_consolidated_sales_upsert_replaces_totals(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let mut input = UpsertConsolidatedSales {
        currency: "EUR".into(),
        marketplace: "Amazon.de".into(),
        period_start: Some(date(2025, 1, 1)),
        period_end: Some(date(2025, 1, 31)),
        total_earnings: 95.0,
        total_earnings_usd: 100.0,
        exchange_rate: Some(0.95),
        payment_count: 3,
        source_imports: vec![],
    };
    let first = ConsolidatedSalesRepo::upsert(&pool, user, &input).await.unwrap();

    input.total_earnings = 190.0;
    input.total_earnings_usd = 200.0;
    let second = ConsolidatedSalesRepo::upsert(&pool, user, &input).await.unwrap();
    assert_eq!(first.id, second.id);

    let rows = ConsolidatedSalesRepo::list(&pool, user).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!((ConsolidatedSalesRepo::total_usd(&pool, user).await.unwrap() - 200.0).abs() < 1e-9);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_consolidated_sales_replace_drops_stale_groups(pool: PgPool) {
    let user = new_user(&pool, "ada").await;
    let other = new_user(&pool, "bo").await;
    let group = |currency: &str, marketplace: &str, usd: f64| UpsertConsolidatedSales {
        currency: currency.into(),
        marketplace: marketplace.into(),
        period_start: None,
        period_end: None,
        total_earnings: usd,
        total_earnings_usd: usd,
        exchange_rate: Some(1.0),
        payment_count: 1,
        source_imports: vec![],
    };
    ConsolidatedSalesRepo::upsert(&pool, user, &group("EUR", "Amazon.de", 40.0)).await.unwrap();
    ConsolidatedSalesRepo::upsert(&pool, user, &group("USD", "Amazon.com", 25.0)).await.unwrap();
    ConsolidatedSalesRepo::upsert(&pool, other, &group("EUR", "Amazon.de", 7.0)).await.unwrap();

    let stored = ConsolidatedSalesRepo::replace_for_user(&pool, user, &[group("USD", "Amazon.com", 30.0)])
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);

    let rows = ConsolidatedSalesRepo::list(&pool, user).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].currency, "USD");
    assert!((rows[0].total_earnings_usd - 30.0).abs() < 1e-9);

    assert!(ConsolidatedSalesRepo::replace_for_user(&pool, user, &[]).await.unwrap().is_empty());
    assert!(ConsolidatedSalesRepo::list(&pool, user).await.unwrap().is_empty());
    assert_eq!(ConsolidatedSalesRepo::list(&pool, other).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_latest_rates_win(pool: PgPool) {
    ExchangeRateRepo::upsert_rate(&pool, "USD", "EUR", 0.90, date(2025, 1, 1), "api")
        .await
        .unwrap();
    ExchangeRateRepo::upsert_rate(&pool, "USD", "EUR", 0.93, date(2025, 1, 2), "api")
        .await
        .unwrap();
    // Same day again replaces rather than duplicates.
    ExchangeRateRepo::upsert_rate(&pool, "USD", "EUR", 0.94, date(2025, 1, 2), "fallback")
        .await
        .unwrap();

    let latest = ExchangeRateRepo::latest_rate(&pool, "USD", "EUR").await.unwrap().unwrap();
    assert_eq!(latest.rate, 0.94);
    assert_eq!(latest.source, "fallback");

    let table = ExchangeRateRepo::latest_rate_table(&pool).await.unwrap();
    assert_eq!(table.rate("EUR"), Some(0.94));
    assert_eq!(table.rate("USD"), Some(1.0));

    let stored = ExchangeRateRepo::upsert_usd_table(&pool, &RateTable::fallback(), date(2025, 1, 3), "fallback")
        .await
        .unwrap();
    assert_eq!(stored, 9);
    assert_eq!(
        ExchangeRateRepo::latest_date(&pool).await.unwrap(),
        Some(date(2025, 1, 3))
    );
}
