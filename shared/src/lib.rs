//! Shared types for the warehouse backend
//!
//! Error types, the multi-format date value, entity models and API DTOs
//! used by the server and its tests.

pub mod client;
pub mod error;
pub mod flex_date;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use flex_date::FlexDate;
