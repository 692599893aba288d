//! Data models
//!
//! Shared between warehouse-server and the frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are unix millis.

#[macro_use]
pub mod entity;
pub mod user;
pub mod warehouse;

// Re-exports
pub use entity::{
    ColumnValue, Entity, EntitySchema, FieldKind, FieldSpec, MissingFields, RowMeta,
};
pub use user::*;
pub use warehouse::*;
