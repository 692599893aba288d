//! Shared server state
//!
//! Cloned into every handler. All fields are cheap handles.
//!
//! | Field           | Type                  | Purpose                    |
//! |-----------------|-----------------------|----------------------------|
//! | config          | Arc<Config>           | Immutable settings         |
//! | db              | DbService             | SQLite pool                |
//! | jwt_service     | Arc<JwtService>       | Token issue and validation |
//! | rate_limiter    | RateLimiter           | Login throttling           |
//! | clock_allowlist | Arc<IpAllowList>      | Kiosk network check        |

use std::sync::Arc;

use shared::error::AppError;
use sqlx::SqlitePool;

use crate::auth::{IpAllowList, JwtConfig, JwtService, RateLimiter};
use crate::core::Config;
use crate::db::{DbService, ResourceEngine, SqlEntity, users};

#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub rate_limiter: RateLimiter,
    pub clock_allowlist: Arc<IpAllowList>,
}

impl ServerState {
    /// Build state around an open database
    pub fn new(config: Config, db: DbService) -> Self {
        let jwt_service = JwtService::with_config(JwtConfig::new(
            config.jwt_secret.clone(),
            config.jwt_expiration_minutes,
        ));
        let clock_allowlist = IpAllowList::parse(&config.clock_allowed_cidrs);
        tracing::info!(
            blocks = ?clock_allowlist.blocks().iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Clock in/out allowed networks"
        );

        Self {
            config: Arc::new(config),
            db,
            jwt_service: Arc::new(jwt_service),
            rate_limiter: RateLimiter::for_login(),
            clock_allowlist: Arc::new(clock_allowlist),
        }
    }

    /// Open the database, apply migrations and seed default accounts
    pub async fn initialize(config: Config) -> Result<Self, AppError> {
        let db = DbService::new(&config.database_path).await?;
        users::seed_default_users(&db.pool).await?;
        Ok(Self::new(config, db))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// Resource engine for one entity table
    pub fn engine<T: SqlEntity>(&self) -> ResourceEngine<T> {
        self.db.engine()
    }
}
