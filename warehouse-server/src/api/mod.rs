//! API routes
//!
//! - [`health`] - liveness probe
//! - [`auth`] - login and current user
//! - [`users`] - account management
//! - [`resources`] - generic CRUD/sync/import for every warehouse table
//! - [`clock`] - kiosk clock in/out
//! - [`extract`] - `Json`/`Path` extractors that reject with `AppError`

pub mod auth;
pub mod clock;
pub mod extract;
pub mod health;
pub mod resources;
pub mod users;

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderValue, Method, header};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};

/// All routes, without global middleware
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        // Health - public
        .merge(health::router())
        // Auth - login is public and rate limited
        .merge(auth::router(state))
        // Kiosk clock - public reads, network-restricted writes
        .merge(clock::router(state))
        // Users - authentication required
        .merge(users::router())
        // Warehouse tables - authentication required
        .merge(resources::router())
}

/// Router with middleware, used by the server and by tests
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let router = build_router(state);
    let router = match spa_fallback(&state.config) {
        Some(spa) => router.fallback_service(spa),
        None => router,
    };

    router
        // JWT authentication for /api/* (public routes skipped)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    tracing::info!(?origins, "CORS allowed origins");

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Static frontend with `index.html` fallback for client-side routes
fn spa_fallback(config: &Config) -> Option<ServeDir<ServeFile>> {
    let dir = &config.static_dir;
    if !dir.is_dir() {
        tracing::info!(dir = %dir.display(), "Static directory not found, SPA serving disabled");
        return None;
    }
    tracing::info!(dir = %dir.display(), "Serving SPA");
    Some(ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))))
}
