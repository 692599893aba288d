//! Warehouse operations backend
//!
//! Twelve warehouse tables behind one generic CRUD/sync/import engine,
//! plus accounts, JWT auth and the attendance kiosk endpoints.
//!
//! ```text
//! warehouse-server/src/
//! ├── core/          # config, state, server loop
//! ├── auth/          # JWT, argon2, rate limiting, IP allow-list
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # SQLite pool, resource engine, users, date migration
//! └── utils/         # logging
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResult};

/// Structured event on the `security` target
///
/// Routed to `security/` log files when file logging is on.
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
 _      __              __                    
| | /| / /__ ________  / /  ___  __ _____ ___ 
| |/ |/ / _ `/ __/ -_)/ _ \/ _ \/ // (_-</ -_)
|__/|__/\_,_/_/  \__//_//_/\___/\_,_/___/\__/ 
    "#
    );
}
