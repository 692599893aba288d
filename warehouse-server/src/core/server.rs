//! HTTP server startup and shutdown

use std::net::SocketAddr;

use anyhow::Context;

use crate::api;
use crate::auth::rate_limit::spawn_cleanup;
use crate::core::ServerState;

pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    /// Serve until Ctrl+C
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        let cleanup = spawn_cleanup(self.state.rate_limiter.clone());
        let app = api::build_app(&self.state).with_state(self.state.clone());

        tracing::info!("Warehouse server listening on {addr}");

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

        cleanup.abort();
        self.state.db.pool.close().await;
        Ok(())
    }
}
