use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Extension,
};
use dashmap::DashMap;

use crate::types::AppError;

/// Default number of requests allowed per window
pub const DEFAULT_MAX_REQUESTS: u32 = 100;
/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Fixed window rate limit parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per client per window
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-client fixed window counter
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// Counts a request for `client`, returning `false` once the client is
    /// over its budget for the current window
    #[must_use]
    pub fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut window = self.windows.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.config.max_requests {
            return false;
        }

        window.count += 1;
        true
    }

    /// Drops windows that have run out, returning how many
    pub fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.config.window);
        before.saturating_sub(self.windows.len())
    }
}

/// Peer address, else the first `X-Forwarded-For` hop
fn client_key(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Rate limiting middleware
///
/// # Errors
///
/// - `AppError` - 429 once the client exceeded its budget
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request);

    if !limiter.check(&client) {
        tracing::warn!(%client, "Rate limit exceeded");
        return Err(AppError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many requests, please try again later",
            true,
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_budget_is_per_client() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
        });

        assert!(limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.1"));
        assert!(!limiter.check("10.0.0.1"));
        assert!(limiter.check("10.0.0.2"));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window: Duration::from_millis(20),
        });

        assert!(limiter.check("client"));
        assert!(!limiter.check("client"));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(limiter.purge_stale(), 1);
        assert!(limiter.check("client"));
    }

    #[test]
    fn test_client_key() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.7");

        let mut request = Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_key(&request), "192.0.2.1");

        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
