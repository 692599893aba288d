//! Authentication and access control
//!
//! - [`JwtService`] - token issue and validation
//! - [`CurrentUser`] - authenticated caller
//! - [`require_auth`] - bearer token middleware
//! - [`login_rate_limit`] - per-IP login throttling
//! - [`require_clock_network`] - kiosk network allow-list

pub mod extractor;
pub mod ip_allowlist;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod rate_limit;

pub use ip_allowlist::{IpAllowList, require_clock_network};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{ensure_super, require_auth};
pub use rate_limit::{RateLimiter, login_rate_limit};
