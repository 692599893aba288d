//! Core module - configuration, shared state and the HTTP server
//!
//! - [`Config`] - environment configuration
//! - [`ServerState`] - handles shared by every request
//! - [`Server`] - listener and graceful shutdown

pub mod config;
pub mod server;
pub mod state;

pub use config::{BoxError, Config};
pub use server::Server;
pub use state::ServerState;
