//! Server configuration
//!
//! Loaded once from environment variables (`.env` is read by `main`).
//!
//! | Variable                 | Default                                   |
//! |--------------------------|-------------------------------------------|
//! | DATABASE_PATH            | ./warehouse.db                            |
//! | HTTP_PORT                | 8080                                      |
//! | ENVIRONMENT              | development                               |
//! | JWT_SECRET               | required outside development              |
//! | JWT_EXPIRATION_MINUTES   | 1440                                      |
//! | CORS_ORIGINS             | localhost dev origins                     |
//! | CLOCK_ALLOWED_CIDRS      | 192.168.6.0/24,172.16.0.0/12,127.0.0.0/8  |
//! | STATIC_DIR               | ./public                                  |
//! | LOG_LEVEL                | info                                      |
//! | LOG_JSON                 | false                                     |
//! | LOG_DIR                  | unset (console only)                      |

use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:8080,http://localhost:8070";
pub const DEFAULT_CLOCK_CIDRS: &str = "192.168.6.0/24,172.16.0.0/12,127.0.0.0/8";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub cors_origins: Vec<String>,
    /// Raw comma separated list, parsed into an allow-list at startup
    pub clock_allowed_cidrs: String,
    /// Built frontend, served for non-API paths when present
    pub static_dir: PathBuf,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => Ok(v),
            Ok(_) if environment != "development" => {
                Err(format!("{name} must not be empty in {environment} environment").into())
            }
            Err(_) if environment != "development" => {
                Err(format!("{name} must be set in {environment} environment").into())
            }
            _ => {
                tracing::warn!("{name} not set, using development fallback");
                Ok(format!("dev-{name}-not-for-production"))
            }
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./warehouse.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1440),
            cors_origins: parse_list(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
            ),
            clock_allowed_cidrs: std::env::var("CLOCK_ALLOWED_CIDRS")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CLOCK_CIDRS.into()),
            static_dir: std::env::var("STATIC_DIR")
                .unwrap_or_else(|_| "./public".into())
                .into(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        })
    }

    /// Defaults with a fixed JWT secret, for tests
    pub fn for_tests(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            http_port: 0,
            environment: "development".into(),
            jwt_secret: "test-secret-0123456789-abcdefghijkl".into(),
            jwt_expiration_minutes: 60,
            cors_origins: parse_list(DEFAULT_CORS_ORIGINS),
            clock_allowed_cidrs: DEFAULT_CLOCK_CIDRS.into(),
            static_dir: PathBuf::from("./public"),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Split a comma separated list, trimming blanks
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims() {
        assert_eq!(
            parse_list(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_require_secret_outside_development() {
        let err = Config::require_secret("WAREHOUSE_TEST_UNSET_SECRET", "production").unwrap_err();
        assert!(err.to_string().contains("must be set in production"));

        let dev = Config::require_secret("WAREHOUSE_TEST_UNSET_SECRET", "development").unwrap();
        assert_eq!(dev, "dev-WAREHOUSE_TEST_UNSET_SECRET-not-for-production");
    }
}
