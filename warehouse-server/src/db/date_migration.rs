//! Date column normalization
//!
//! One-off maintenance pass that rewrites every text date column into the
//! canonical `YYYY-MM-DD[ HH:MM:SS]` form. Writes go straight to the column,
//! bypassing the resource engine and its required-field checks.

use shared::FlexDate;
use shared::models::ENTITY_SCHEMAS;
use sqlx::SqlitePool;

/// Counts for one `(table, column)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReport {
    pub table: &'static str,
    pub column: &'static str,
    pub read: u64,
    pub updated: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub columns: Vec<ColumnReport>,
}

impl MigrationReport {
    pub fn total_read(&self) -> u64 {
        self.columns.iter().map(|c| c.read).sum()
    }

    pub fn total_updated(&self) -> u64 {
        self.columns.iter().map(|c| c.updated).sum()
    }

    pub fn total_skipped(&self) -> u64 {
        self.columns.iter().map(|c| c.skipped).sum()
    }
}

/// Every `(table, column)` holding a date
pub fn date_columns() -> Vec<(&'static str, &'static str)> {
    ENTITY_SCHEMAS
        .iter()
        .flat_map(|schema| schema.date_columns().map(move |c| (schema.table, c)))
        .collect()
}

/// Normalize all date columns. With `dry_run` nothing is written but the
/// counts are reported as if it had been.
///
/// A column that cannot be read is logged and left out of the report; the
/// remaining columns are still processed.
pub async fn normalize_dates(pool: &SqlitePool, dry_run: bool) -> MigrationReport {
    let mut report = MigrationReport::default();

    for (table, column) in date_columns() {
        match normalize_column(pool, table, column, dry_run).await {
            Ok(column_report) => {
                tracing::info!(
                    "{table}.{column}: {} rows read, {} updated, {} skipped",
                    column_report.read,
                    column_report.updated,
                    column_report.skipped
                );
                report.columns.push(column_report);
            }
            Err(e) => {
                tracing::error!(table, column, error = %e, "Failed to read date column");
            }
        }
    }

    tracing::info!(
        dry_run,
        "Date migration complete: {} rows read, {} updated, {} skipped",
        report.total_read(),
        report.total_updated(),
        report.total_skipped()
    );
    report
}

async fn normalize_column(
    pool: &SqlitePool,
    table: &'static str,
    column: &'static str,
    dry_run: bool,
) -> Result<ColumnReport, sqlx::Error> {
    let select = format!(
        "SELECT id, {column} FROM {table} \
         WHERE {column} IS NOT NULL AND {column} != '' AND deleted_at IS NULL"
    );
    let rows: Vec<(i64, String)> = sqlx::query_as(&select).fetch_all(pool).await?;

    let update = format!("UPDATE {table} SET {column} = ? WHERE id = ?");
    let mut report = ColumnReport {
        table,
        column,
        read: rows.len() as u64,
        updated: 0,
        skipped: 0,
    };

    for (id, raw) in rows {
        let parsed = FlexDate::parse(&raw);
        let canonical = parsed.to_string();
        if canonical == raw {
            continue;
        }
        if !parsed.is_present() {
            tracing::warn!("  SKIP {table}.{column} id={id} value={raw:?} (unparseable)");
            report.skipped += 1;
            continue;
        }

        if dry_run {
            tracing::debug!("  {table}.{column} id={id}: {raw:?} -> {canonical:?}");
            report.updated += 1;
            continue;
        }

        match sqlx::query(&update)
            .bind(&canonical)
            .bind(id)
            .execute(pool)
            .await
        {
            Ok(_) => report.updated += 1,
            Err(e) => {
                tracing::warn!("  ERROR {table}.{column} id={id}: {e}");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}
