//! Login rate limiting
//!
//! Sliding window per client IP: at most [`LOGIN_MAX_ATTEMPTS`] attempts in
//! any [`LOGIN_WINDOW`]. A background task calls [`RateLimiter::cleanup`]
//! every [`CLEANUP_INTERVAL`] to drop idle entries.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::core::ServerState;
use crate::security_log;

pub const LOGIN_MAX_ATTEMPTS: usize = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(60);
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Outcome of one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Seconds until the oldest attempt leaves the window
    Limited { retry_after_secs: u64 },
}

#[derive(Clone)]
pub struct RateLimiter {
    /// IP -> attempt timestamps inside the window
    inner: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// Login limits: 5 attempts per minute
    pub fn for_login() -> Self {
        Self::new(LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
    }

    /// Record an attempt from `ip` unless the window is already full
    pub async fn check(&self, ip: &str) -> RateDecision {
        self.check_at(ip, Instant::now()).await
    }

    async fn check_at(&self, ip: &str, now: Instant) -> RateDecision {
        let mut map = self.inner.lock().await;
        let attempts = map.entry(ip.to_owned()).or_default();
        attempts.retain(|t| now.duration_since(*t) < self.window);

        if attempts.len() >= self.max_attempts {
            let oldest = attempts.iter().min().copied().unwrap_or(now);
            let remaining = self.window.saturating_sub(now.duration_since(oldest));
            let retry_after_secs = remaining.as_secs_f64().ceil().max(1.0) as u64;
            return RateDecision::Limited { retry_after_secs };
        }

        attempts.push(now);
        RateDecision::Allowed
    }

    /// Drop expired timestamps and empty entries
    pub async fn cleanup(&self) {
        self.cleanup_at(Instant::now()).await;
    }

    async fn cleanup_at(&self, now: Instant) {
        let mut map = self.inner.lock().await;
        for attempts in map.values_mut() {
            attempts.retain(|t| now.duration_since(*t) < self.window);
        }
        map.retain(|_, attempts| !attempts.is_empty());
    }

    /// Number of IPs currently tracked
    pub async fn tracked_ips(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Spawn the periodic sweep
pub fn spawn_cleanup(limiter: RateLimiter) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            limiter.cleanup().await;
            let tracked = limiter.tracked_ips().await;
            tracing::debug!(tracked, "Rate limiter sweep");
        }
    })
}

/// Client IP: first X-Forwarded-For entry, then the socket peer address
///
/// The header is taken as-is, so this assumes a trusted reverse proxy that
/// overwrites it. Exposed directly, clients can rotate it to dodge the limit.
pub fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Rate limit middleware for the login route
pub async fn login_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if let RateDecision::Limited { retry_after_secs } = state.rate_limiter.check(&ip).await {
        security_log!(
            "WARN",
            "login_rate_limited",
            ip = ip.as_str(),
            retry_after = retry_after_secs
        );
        return Err(AppError::too_many_attempts(retry_after_secs));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sixth_attempt_limited() {
        let limiter = RateLimiter::for_login();
        let start = Instant::now();

        for i in 0..5 {
            let at = start + Duration::from_secs(i);
            assert_eq!(limiter.check_at("10.0.0.1", at).await, RateDecision::Allowed);
        }

        let decision = limiter
            .check_at("10.0.0.1", start + Duration::from_secs(10))
            .await;
        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after_secs: 50
            }
        );

        // other clients are unaffected
        assert_eq!(
            limiter.check_at("10.0.0.2", start + Duration::from_secs(10)).await,
            RateDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::for_login();
        let start = Instant::now();

        for i in 0..5 {
            limiter
                .check_at("10.0.0.1", start + Duration::from_secs(i * 10))
                .await;
        }
        // first attempt (t=0) expires at t=60
        assert_eq!(
            limiter.check_at("10.0.0.1", start + Duration::from_secs(60)).await,
            RateDecision::Allowed
        );
        assert!(matches!(
            limiter.check_at("10.0.0.1", start + Duration::from_secs(61)).await,
            RateDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn test_retry_after_at_least_one_second() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at("ip", start).await;

        let decision = limiter
            .check_at("ip", start + Duration::from_millis(59_900))
            .await;
        assert_eq!(decision, RateDecision::Limited { retry_after_secs: 1 });
    }

    #[tokio::test]
    async fn test_cleanup_drops_stale_entries() {
        let limiter = RateLimiter::for_login();
        let start = Instant::now();
        limiter.check_at("old", start).await;
        limiter
            .check_at("fresh", start + Duration::from_secs(100))
            .await;
        assert_eq!(limiter.tracked_ips().await, 2);

        limiter.cleanup_at(start + Duration::from_secs(120)).await;
        assert_eq!(limiter.tracked_ips().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_task_runs_on_the_runtime() {
        let limiter = RateLimiter::for_login();
        limiter.check("10.0.0.2").await;

        let handle = spawn_cleanup(limiter.clone());
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(limiter.tracked_ips().await, 1);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "203.0.113.9");

        let request = Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }
}
