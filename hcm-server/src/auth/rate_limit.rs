//! Fixed-window rate limiting for the public auth routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// Entries idle longer than this are dropped by [`RateLimiter::cleanup`]
const STALE_AFTER: Duration = Duration::from_secs(300);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// (route, IP) -> window
    inner: Arc<DashMap<(&'static str, String), IpEntry>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited
    pub fn check(&self, route: &'static str, ip: &str, max_requests: u32, window_secs: u64) -> bool {
        let now = Instant::now();
        let mut entry = self
            .inner
            .entry((route, ip.to_owned()))
            .or_insert_with(|| IpEntry {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Drop windows that started more than 5 minutes ago
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.inner
            .retain(|_, entry| now.duration_since(entry.window_start) < STALE_AFTER);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Client IP: first `X-Forwarded-For` entry, then the peer address
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

/// Login limiter: `LOGIN_RATE_LIMIT` requests per minute per IP
pub async fn login_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if !state
        .rate_limiter
        .check("login", &ip, state.config.login_rate_limit, 60)
    {
        security_log!("WARN", "rate_limited", route = "login", ip = ip);
        return Err(AppError::too_many_requests());
    }
    Ok(next.run(request).await)
}

/// Password reset limiter; shares the login budget on its own window
pub async fn reset_rate_limit(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = extract_ip(&request);
    if !state
        .rate_limiter
        .check("password_reset", &ip, state.config.login_rate_limit, 60)
    {
        security_log!("WARN", "rate_limited", route = "password_reset", ip = ip);
        return Err(AppError::too_many_requests());
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_limits_per_ip() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("login", "10.0.0.1", 3, 60));
        }
        assert!(!limiter.check("login", "10.0.0.1", 3, 60));
        // Other IPs and routes have their own windows
        assert!(limiter.check("login", "10.0.0.2", 3, 60));
        assert!(limiter.check("password_reset", "10.0.0.1", 3, 60));
    }

    #[test]
    fn test_expired_window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("login", "10.0.0.1", 1, 0));
        assert!(limiter.check("login", "10.0.0.1", 1, 0));
    }

    #[test]
    fn test_cleanup_keeps_fresh_entries() {
        let limiter = RateLimiter::new();
        limiter.check("login", "10.0.0.1", 5, 60);
        limiter.cleanup();
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&req), "203.0.113.9");

        let req = Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_ip(&req), "unknown");
    }
}
