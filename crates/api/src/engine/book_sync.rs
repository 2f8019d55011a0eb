//! Reconcile an import's sales rows with the user's book catalogue.

use std::collections::HashSet;

use chrono::Utc;
use kdpdesk_core::isbn::{random_placeholder, timestamp_placeholder, MAX_PLACEHOLDER_ATTEMPTS};
use kdpdesk_core::kdp::detection::KdpFileType;
use kdpdesk_core::kdp::reconcile::{
    group_by_identifier, plan_book, AutoCreationOptions, BookCreationResult, BookPlan,
    ImportPreview, SourceRow, DEFAULT_LANGUAGE, DEFAULT_MARKETPLACE,
};
use kdpdesk_core::types::DbId;
use kdpdesk_core::validation::PROJECT_PUBLISHED;
use kdpdesk_db::models::author::CreateAuthor;
use kdpdesk_db::models::book::{Book, CreateBook, UpdateBook};
use kdpdesk_db::models::kdp_import::KdpImport;
use kdpdesk_db::repositories::{AuthorRepo, BookRepo, EstimatorDataRepo, KdpImportDataRepo};
use sqlx::PgPool;

/// A placeholder ISBN no book uses yet. Falls back to a timestamp-based one
/// after [`MAX_PLACEHOLDER_ATTEMPTS`] collisions.
pub async fn unique_placeholder(pool: &PgPool) -> Result<String, sqlx::Error> {
    for _ in 0..MAX_PLACEHOLDER_ATTEMPTS {
        let candidate = random_placeholder();
        if !BookRepo::placeholder_exists(pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    tracing::warn!("Random placeholder ISBNs exhausted, using timestamp");
    Ok(timestamp_placeholder(Utc::now().timestamp_millis()))
}

/// The rows reconciliation works from. Estimator imports read their
/// filtered per-format estimator rows; every other type reads the stored
/// import data.
pub async fn source_rows(
    pool: &PgPool,
    user_id: DbId,
    import: &KdpImport,
) -> Result<Vec<SourceRow>, sqlx::Error> {
    let estimator = KdpFileType::RoyaltiesEstimator;
    if KdpFileType::parse(&import.detected_type) == Some(estimator) {
        let rows = EstimatorDataRepo::list_all_by_import(pool, user_id, import.id).await?;
        return Ok(rows
            .into_iter()
            .filter(|row| estimator.normalizes_sheet(&row.sheet_name))
            .map(|row| SourceRow {
                asin: row.asin,
                isbn: row.isbn,
                title: row.title,
                author_name: row.author_name,
                marketplace: row.marketplace,
                sheet_name: row.sheet_name,
            })
            .collect());
    }

    let rows = KdpImportDataRepo::list_all_by_import(pool, user_id, import.id).await?;
    Ok(rows
        .iter()
        .map(|row| SourceRow::from(&row.to_record()))
        .collect())
}

/// Counts shown before the user confirms book creation.
pub async fn preview(
    pool: &PgPool,
    user_id: DbId,
    import: &KdpImport,
) -> Result<ImportPreview, sqlx::Error> {
    let rows = source_rows(pool, user_id, import).await?;
    let known: HashSet<String> = BookRepo::identifiers(pool, user_id)
        .await?
        .into_iter()
        .collect();
    Ok(ImportPreview::build(
        &rows,
        import.duplicate_records.max(0) as usize,
        |id| known.contains(id),
    ))
}

/// Create or update a catalogue book per identifier found in the import.
/// Problems with one book are collected in `errors` and do not stop the rest.
pub async fn create_books(
    pool: &PgPool,
    user_id: DbId,
    import: &KdpImport,
    options: AutoCreationOptions,
) -> Result<BookCreationResult, sqlx::Error> {
    let rows = source_rows(pool, user_id, import).await?;
    let groups = group_by_identifier(rows);
    let mut result = BookCreationResult {
        skipped: groups.skipped,
        ..Default::default()
    };

    for (identifier, rows) in &groups.groups {
        let plan = match plan_book(identifier, rows) {
            Ok(plan) => plan,
            Err(msg) => {
                result.errors.push(msg);
                continue;
            }
        };

        if let Err(e) = sync_book(pool, user_id, import.id, &plan, options, &mut result).await {
            tracing::warn!(import_id = import.id, identifier = %identifier, error = %e, "Book sync failed");
            result.errors.push(format!("Book {identifier}: {e}"));
        }
    }

    tracing::info!(
        import_id = import.id,
        created = result.books_created,
        updated = result.books_updated,
        errors = result.errors.len(),
        "Books reconciled",
    );
    Ok(result)
}

async fn sync_book(
    pool: &PgPool,
    user_id: DbId,
    import_id: DbId,
    plan: &BookPlan,
    options: AutoCreationOptions,
    result: &mut BookCreationResult,
) -> Result<(), sqlx::Error> {
    let author_id = if options.link_authors {
        Some(find_or_create_author(pool, user_id, plan, result).await?)
    } else {
        None
    };

    let book = match BookRepo::find_by_asin_or_isbn(pool, user_id, &plan.identifier).await? {
        Some(existing) if options.update_existing_books => {
            let updated = update_book(pool, user_id, &existing, plan, author_id).await?;
            result.books_updated += 1;
            updated.unwrap_or(existing)
        }
        Some(existing) => {
            if let Some(author_id) = author_id.filter(|_| existing.author_id.is_none()) {
                BookRepo::set_author(pool, user_id, existing.id, author_id).await?;
            }
            existing
        }
        None => {
            let book = create_book(pool, user_id, plan, author_id).await?;
            result.books_created += 1;
            book
        }
    };

    KdpImportDataRepo::set_matched_book(pool, user_id, import_id, &plan.identifier, book.id).await?;
    Ok(())
}

async fn find_or_create_author(
    pool: &PgPool,
    user_id: DbId,
    plan: &BookPlan,
    result: &mut BookCreationResult,
) -> Result<DbId, sqlx::Error> {
    let name = &plan.author;
    if let Some(author) =
        AuthorRepo::find_by_name(pool, user_id, &name.first_name, name.last_name.as_deref()).await?
    {
        return Ok(author.id);
    }

    let author = AuthorRepo::create(
        pool,
        user_id,
        &CreateAuthor {
            prefix: None,
            first_name: name.first_name.clone(),
            middle_name: None,
            last_name: name.last_name.clone(),
            suffix: None,
            biography: None,
            profile_image_url: None,
        },
    )
    .await?;
    result.authors_created += 1;
    Ok(author.id)
}

async fn create_book(
    pool: &PgPool,
    user_id: DbId,
    plan: &BookPlan,
    author_id: Option<DbId>,
) -> Result<Book, sqlx::Error> {
    let isbn_placeholder = match plan.isbn {
        Some(_) => None,
        None => Some(unique_placeholder(pool).await?),
    };

    BookRepo::create(
        pool,
        user_id,
        &CreateBook {
            author_id,
            title: plan.title.clone(),
            status: Some(PROJECT_PUBLISHED.to_string()),
            language: Some(DEFAULT_LANGUAGE.to_string()),
            author_first_name: Some(plan.author.first_name.clone()),
            author_last_name: plan.author.last_name.clone(),
            primary_marketplace: Some(
                plan.marketplace
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MARKETPLACE.to_string()),
            ),
            format: Some(plan.format.as_str().to_string()),
            isbn: plan.isbn.clone(),
            isbn_placeholder,
            asin: plan.asin.clone(),
            ..Default::default()
        },
    )
    .await
}

/// Refresh title, author and format from the report. Identifiers are only
/// filled in, never replaced.
async fn update_book(
    pool: &PgPool,
    user_id: DbId,
    existing: &Book,
    plan: &BookPlan,
    author_id: Option<DbId>,
) -> Result<Option<Book>, sqlx::Error> {
    BookRepo::update(
        pool,
        user_id,
        existing.id,
        &UpdateBook {
            author_id,
            title: Some(plan.title.clone()),
            author_first_name: Some(plan.author.first_name.clone()),
            author_last_name: plan.author.last_name.clone(),
            primary_marketplace: plan.marketplace.clone(),
            format: Some(plan.format.as_str().to_string()),
            asin: plan.asin.clone().filter(|_| existing.asin.is_none()),
            isbn: plan.isbn.clone().filter(|_| existing.isbn.is_none()),
            ..Default::default()
        },
    )
    .await
}
