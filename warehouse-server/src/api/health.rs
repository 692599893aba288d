//! Health check
//!
//! | Path    | Method | Auth |
//! |---------|--------|------|
//! | /health | GET    | none |

use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// ok | error
    pub status: String,
    pub version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
