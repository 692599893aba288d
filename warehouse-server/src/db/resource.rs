//! Generic resource engine
//!
//! One [`ResourceEngine`] per entity type. SQL is built from the static
//! [`EntitySchema`] so every table shares the same CRUD, bulk delete, sync
//! and import behavior.
//!
//! | Operation    | Effect                                                  |
//! |--------------|---------------------------------------------------------|
//! | list / get   | Non-deleted rows only                                   |
//! | create       | Decode, fill defaults, validate, insert                 |
//! | update       | Overlay payload on the stored row, validate, save       |
//! | delete       | Soft delete (sets `deleted_at`)                         |
//! | bulk_delete  | Soft delete by id list                                  |
//! | sync         | Confirm-gated hard delete + insert, one transaction     |
//! | batch_import | Append in chunks of [`IMPORT_CHUNK_SIZE`], one transaction |

use std::marker::PhantomData;

use serde_json::Value;
use shared::client::{SyncRequest, SyncResponse};
use shared::models::{Entity, EntitySchema, FieldKind, RowMeta};
use shared::util::now_millis;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};

/// Rows per INSERT statement during sync and import
pub const IMPORT_CHUNK_SIZE: usize = 500;

/// Entity types the engine can read back from SQLite
pub trait SqlEntity: Entity + for<'r> FromRow<'r, SqliteRow> {}

impl<T> SqlEntity for T where T: Entity + for<'r> FromRow<'r, SqliteRow> {}

/// Result of a sync request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// `confirm` was not set; nothing was written
    ConfirmationRequired { existing_count: u64, new_count: u64 },
    Replaced(SyncResponse),
}

/// CRUD and bulk operations for one entity table
pub struct ResourceEngine<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceEngine<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: SqlEntity> ResourceEngine<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn schema(&self) -> EntitySchema {
        T::SCHEMA
    }

    pub async fn list(&self) -> RepoResult<Vec<T>> {
        let sql = format!(
            "SELECT * FROM {} WHERE deleted_at IS NULL ORDER BY id",
            T::SCHEMA.table
        );
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> RepoResult<T> {
        let sql = format!(
            "SELECT * FROM {} WHERE id = ? AND deleted_at IS NULL",
            T::SCHEMA.table
        );
        sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("{} {} not found", T::SCHEMA.name, id)))
    }

    /// Number of non-deleted rows
    pub async fn count(&self) -> RepoResult<u64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
            T::SCHEMA.table
        );
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    pub async fn create(&self, payload: Value) -> RepoResult<T> {
        let mut item = decode::<T>(payload)?;
        item.apply_defaults();
        item.validate()
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        let now = now_millis();
        let schema = T::SCHEMA;
        let columns = schema.column_names().collect::<Vec<_>>().join(", ");
        let placeholders = vec!["?"; schema.fields.len() + 2].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}, created_at, updated_at) VALUES ({placeholders})",
            schema.table
        );

        let mut query = sqlx::query(&sql);
        for value in item.column_values() {
            query = query.bind(value);
        }
        let result = query.bind(now).bind(now).execute(&self.pool).await?;

        item.set_meta(RowMeta {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
        });
        Ok(item)
    }

    /// Partial update: fields missing from the payload keep their stored value
    pub async fn update(&self, id: i64, payload: Value) -> RepoResult<T> {
        let existing = self.get(id).await?;
        let Value::Object(changes) = payload else {
            return Err(RepoError::Validation(format!(
                "{} update payload must be a JSON object",
                T::SCHEMA.name
            )));
        };

        let mut merged = match serde_json::to_value(&existing) {
            Ok(Value::Object(map)) => map,
            Ok(_) => serde_json::Map::new(),
            Err(e) => return Err(RepoError::Database(e.to_string())),
        };
        for (key, value) in changes {
            // null clears a date but leaves other columns untouched
            let is_date = T::SCHEMA
                .field(&key)
                .is_some_and(|f| f.kind == FieldKind::Date);
            if value.is_null() && !is_date {
                continue;
            }
            merged.insert(key, value);
        }

        let mut item = decode::<T>(Value::Object(merged))?;
        item.validate()
            .map_err(|e| RepoError::Validation(e.to_string()))?;

        let now = now_millis();
        let meta = existing.meta();
        item.set_meta(RowMeta {
            updated_at: now,
            ..meta
        });

        let schema = T::SCHEMA;
        let assignments = schema
            .column_names()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments}, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            schema.table
        );

        let mut query = sqlx::query(&sql);
        for value in item.column_values() {
            query = query.bind(value);
        }
        let result = query.bind(now).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!(
                "{} {} not found",
                schema.name, id
            )));
        }
        Ok(item)
    }

    /// Soft delete. Unknown or already deleted ids are not an error.
    pub async fn delete(&self, id: i64) -> RepoResult<()> {
        let sql = format!(
            "UPDATE {} SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL",
            T::SCHEMA.table
        );
        sqlx::query(&sql)
            .bind(now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Soft delete every listed id; returns the number of ids requested
    pub async fn bulk_delete(&self, ids: &[i64]) -> RepoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("UPDATE {} SET deleted_at = ", T::SCHEMA.table));
        builder.push_bind(now_millis());
        builder.push(" WHERE deleted_at IS NULL AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        builder.build().execute(&self.pool).await?;
        Ok(ids.len() as u64)
    }

    /// Replace the whole table with `request.data`
    ///
    /// Without `confirm` only counts are returned. With it, every row
    /// (soft-deleted ones included) is hard-deleted and the new rows inserted
    /// in one transaction; any failure leaves the table as it was.
    pub async fn sync(&self, request: SyncRequest, actor: &str) -> RepoResult<SyncOutcome> {
        let rows = decode_all::<T>(request.data)?;
        let existing = self.count().await?;
        let new_count = rows.len() as u64;

        if !request.confirm {
            return Ok(SyncOutcome::ConfirmationRequired {
                existing_count: existing,
                new_count,
            });
        }

        let name = T::SCHEMA.name;
        tracing::info!(
            "[SYNC] {name}: replacing {existing} existing records with {new_count} new records (by {actor})"
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DELETE FROM {}", T::SCHEMA.table))
            .execute(&mut *tx)
            .await?;
        insert_rows(&mut tx, rows, now_millis()).await?;
        tx.commit().await?;

        tracing::info!("[SYNC] {name}: completed successfully ({new_count} records)");
        Ok(SyncOutcome::Replaced(SyncResponse {
            synced: new_count,
            total: new_count,
            replaced: existing,
        }))
    }

    /// Append rows without touching existing data; all or nothing
    pub async fn batch_import(&self, data: Vec<Value>) -> RepoResult<u64> {
        let rows = decode_all::<T>(data)?;
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let imported = insert_rows(&mut tx, rows, now_millis()).await?;
        tx.commit().await?;

        tracing::info!(
            resource = T::SCHEMA.resource,
            imported,
            "Batch import completed"
        );
        Ok(imported)
    }
}

fn decode<T: Entity>(payload: Value) -> RepoResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| RepoError::Validation(format!("Invalid {} payload: {e}", T::SCHEMA.name)))
}

fn decode_all<T: Entity>(data: Vec<Value>) -> RepoResult<Vec<T>> {
    data.into_iter()
        .enumerate()
        .map(|(idx, payload)| {
            decode::<T>(payload).map_err(|e| match e {
                RepoError::Validation(msg) => RepoError::Validation(format!("row {}: {msg}", idx + 1)),
                other => other,
            })
        })
        .collect()
}

/// Insert rows in chunks on an open connection, usually a transaction.
///
/// Rows are checked chunk by chunk as they are written; the first invalid
/// row aborts with a validation error and the caller's transaction is rolled
/// back when dropped.
async fn insert_rows<T: Entity>(
    conn: &mut SqliteConnection,
    mut rows: Vec<T>,
    now: i64,
) -> RepoResult<u64> {
    let schema = T::SCHEMA;
    let columns = schema.column_names().collect::<Vec<_>>().join(", ");
    let mut inserted = 0u64;

    for (chunk_idx, chunk) in rows.chunks_mut(IMPORT_CHUNK_SIZE).enumerate() {
        for (offset, row) in chunk.iter_mut().enumerate() {
            row.apply_defaults();
            row.validate().map_err(|e| {
                RepoError::Validation(format!(
                    "row {}: {e}",
                    chunk_idx * IMPORT_CHUNK_SIZE + offset + 1
                ))
            })?;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "INSERT INTO {} ({columns}, created_at, updated_at) ",
            schema.table
        ));
        builder.push_values(chunk.iter(), |mut b, row| {
            for value in row.column_values() {
                b.push_bind(value);
            }
            b.push_bind(now).push_bind(now);
        });
        let result = builder.build().execute(&mut *conn).await?;

        inserted += result.rows_affected();
        tracing::debug!(
            table = schema.table,
            chunk = chunk_idx + 1,
            rows = chunk.len(),
            "Inserted chunk"
        );
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use serde_json::json;
    use shared::models::{Arrival, Employee, Unloading};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // one connection, otherwise each pooled connection gets its own memory db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        DbService::migrate(&pool).await.unwrap();
        pool
    }

    fn unloading(brand: &str) -> Value {
        json!({"date": "05/01/2024", "brand": brand, "vehicle_type": "CDD", "total_vehicles": 2})
    }

    #[tokio::test]
    async fn test_create_assigns_meta_and_defaults() {
        let engine = ResourceEngine::<Arrival>::new(test_pool().await);

        let created = engine
            .create(json!({"id": 77, "date": "25/12/2024", "receipt_no": "RCV-1", "po_qty": 12}))
            .await
            .unwrap();

        assert!(created.id > 0);
        assert_ne!(created.id, 77);
        assert!(created.created_at > 0);
        assert_eq!(created.item_type, "Barang Jual");

        let stored = engine.get(created.id).await.unwrap();
        assert_eq!(stored.date.to_string(), "2024-12-25");
        assert_eq!(stored.po_qty, 12);
        assert_eq!(stored.item_type, "Barang Jual");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required() {
        let engine = ResourceEngine::<Employee>::new(test_pool().await);

        let err = engine.create(json!({"nik": "1001"})).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(ref m) if m.contains("name")));
        assert_eq!(engine.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_type() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);

        let err = engine
            .create(json!({"date": "2024-05-01", "brand": "ACME", "total_vehicles": "three"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        let err = engine.get(42).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound(ref m) if m == "Unloading 42 not found"));
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        let created = engine.create(unloading("ACME")).await.unwrap();

        let updated = engine
            .update(created.id, json!({"total_vehicles": 5, "vehicle_type": null}))
            .await
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.brand, "ACME");
        assert_eq!(updated.vehicle_type, "CDD");
        assert_eq!(updated.total_vehicles, 5);

        let stored = engine.get(created.id).await.unwrap();
        assert_eq!(stored.total_vehicles, 5);
        assert_eq!(stored.date.to_string(), "2024-05-01");
    }

    #[tokio::test]
    async fn test_update_revalidates() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        let created = engine.create(unloading("ACME")).await.unwrap();

        let err = engine
            .update(created.id, json!({"date": null}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(ref m) if m.contains("date")));

        let err = engine.update(created.id, json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_deleted_row_is_not_found() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        let created = engine.create(unloading("ACME")).await.unwrap();
        engine.delete(created.id).await.unwrap();

        let err = engine
            .update(created.id, json!({"brand": "Other"}))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        let created = engine.create(unloading("ACME")).await.unwrap();

        engine.delete(created.id).await.unwrap();
        engine.delete(created.id).await.unwrap();
        engine.delete(9999).await.unwrap();
        assert!(engine.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_requested_count() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        let a = engine.create(unloading("A")).await.unwrap();
        let b = engine.create(unloading("B")).await.unwrap();
        let c = engine.create(unloading("C")).await.unwrap();

        let deleted = engine.bulk_delete(&[a.id, b.id, 12345]).await.unwrap();
        assert_eq!(deleted, 3);

        let remaining = engine.list().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, c.id);

        assert_eq!(engine.bulk_delete(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_import_empty_is_noop() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        assert_eq!(engine.batch_import(Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sync_without_confirm_reports_counts() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        engine.create(unloading("A")).await.unwrap();

        let outcome = engine
            .sync(
                SyncRequest {
                    data: vec![unloading("X"), unloading("Y")],
                    confirm: false,
                },
                "supervisor",
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::ConfirmationRequired {
                existing_count: 1,
                new_count: 2
            }
        );
        assert_eq!(engine.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sync_confirmed_with_empty_data_clears_table() {
        let engine = ResourceEngine::<Unloading>::new(test_pool().await);
        engine.create(unloading("A")).await.unwrap();
        engine.create(unloading("B")).await.unwrap();

        let outcome = engine
            .sync(
                SyncRequest {
                    data: Vec::new(),
                    confirm: true,
                },
                "leader",
            )
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Replaced(SyncResponse {
                synced: 0,
                total: 0,
                replaced: 2
            })
        );
        assert_eq!(engine.count().await.unwrap(), 0);
    }
}
