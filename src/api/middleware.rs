//! API Middleware (Rate Limiting, Logging, Timeouts)

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
    BoxError,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use super::handlers::AppState;
use crate::models::config::ServerConfig;
use crate::models::errors::{AppError, ErrorCode};
use crate::utils::constants::RATE_LIMIT_MAX_STORE_SIZE;

/// Rate limiter configuration
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests per window
    pub requests_per_window: u32,
    /// Window duration
    pub window_duration: Duration,
    /// Entry count that triggers forced eviction
    pub max_entries: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for RateLimitConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            requests_per_window: config.rate_limit_max_requests.max(1),
            window_duration: config.rate_limit_window,
            max_entries: RATE_LIMIT_MAX_STORE_SIZE,
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

/// Fixed-window per-client limiter.
///
/// Counters live in this process only. Several instances behind a load
/// balancer each enforce their own window; a shared counter store is
/// needed for a global limit.
pub struct RateLimiter {
    /// Request count and window start per client key
    requests: DashMap<String, (u32, Instant)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request for `key` and decide whether it may proceed
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let limit = self.config.requests_per_window;

        let decision = {
            let mut entry = self.requests.entry(key.to_string()).or_insert((0, now));

            // Reset window if expired
            if now.duration_since(entry.1) >= self.config.window_duration {
                entry.0 = 0;
                entry.1 = now;
            }

            let elapsed = now.duration_since(entry.1);
            let reset_secs = self
                .config
                .window_duration
                .saturating_sub(elapsed)
                .as_secs()
                .max(1);

            if entry.0 >= limit {
                RateLimitDecision {
                    allowed: false,
                    limit,
                    remaining: 0,
                    reset_secs,
                }
            } else {
                entry.0 += 1;
                RateLimitDecision {
                    allowed: true,
                    limit,
                    remaining: limit - entry.0,
                    reset_secs,
                }
            }
        };

        if self.requests.len() > self.config.max_entries {
            self.evict_oldest();
        }

        decision
    }

    /// Drop windows that have fully expired
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();
        let window = self.config.window_duration;
        self.requests
            .retain(|_, (_, started)| now.duration_since(*started) < window);
        before.saturating_sub(self.requests.len())
    }

    /// Store over capacity: drop the oldest 20% of windows
    fn evict_oldest(&self) {
        let mut windows: Vec<(String, Instant)> = self
            .requests
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().1))
            .collect();
        windows.sort_by_key(|(_, started)| *started);

        let evict = (windows.len() / 5).max(1);
        for (key, _) in windows.into_iter().take(evict) {
            self.requests.remove(&key);
        }
        warn!(evicted = evict, "⚠️ Rate limiter store over capacity, evicted oldest windows");
    }

    /// Number of tracked clients
    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Client IP from proxy headers: `CF-Connecting-IP`, first
/// `X-Forwarded-For` entry, `X-Real-IP`, else `unknown`
pub fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("cf-connecting-ip")
        .or_else(|| header("x-forwarded-for").and_then(|v| v.split(',').next()).map(str::trim))
        .or_else(|| header("x-real-ip"))
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn is_unmetered(path: &str) -> bool {
    matches!(path, "/health" | "/v1/health" | "/v1/stats")
}

fn set_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    headers.insert("x-ratelimit-limit", decision.limit.into());
    headers.insert("x-ratelimit-remaining", decision.remaining.into());
    headers.insert("x-ratelimit-reset", decision.reset_secs.into());
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    // Skip rate limiting for health and stats
    if is_unmetered(request.uri().path()) {
        return next.run(request).await;
    }

    let key = client_ip(request.headers());
    let decision = state.rate_limiter.check(&key);

    if !decision.allowed {
        warn!(client = %key, reset_secs = decision.reset_secs, "🚫 Rate limit exceeded");
        let mut response = AppError::rate_limited(decision.reset_secs).into_response();
        let headers = response.headers_mut();
        set_rate_limit_headers(headers, &decision);
        headers.insert("retry-after", decision.reset_secs.into());
        return response;
    }

    let mut response = next.run(request).await;
    set_rate_limit_headers(response.headers_mut(), &decision);
    response
}

/// Request logging middleware; tags every response with `x-request-id`
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = Uuid::new_v4().to_string();

    let mut response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), value);
    }

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}

/// Converts tower timeout/overload errors into API errors
pub async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        warn!("⏱️ Request exceeded server timeout");
        AppError::new(ErrorCode::RequestTimeout, "Request timed out. Please try again.").into_response()
    } else {
        AppError::internal(format!("Unhandled middleware error: {}", err)).into_response()
    }
}

/// Periodic cleanup of rate limiter windows and expired cache entries
pub fn start_cleanup_task(state: Arc<AppState>) {
    let interval_secs = state.rate_limiter.config().window_duration.as_secs().max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let removed = state.rate_limiter.cleanup();
            if removed > 0 {
                info!("🧹 Rate limiter cleanup: {} expired windows removed", removed);
            }
            if let Some(cache) = state.analyzer.cache() {
                cache.cleanup_expired();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_window: max,
            window_duration: Duration::from_secs(60),
            max_entries: 10,
        })
    }

    #[test]
    fn test_fixed_window() {
        let limiter = limiter(3);
        assert_eq!(limiter.check("1.2.3.4").remaining, 2);
        assert_eq!(limiter.check("1.2.3.4").remaining, 1);
        assert_eq!(limiter.check("1.2.3.4").remaining, 0);
        let denied = limiter.check("1.2.3.4");
        assert!(!denied.allowed);
        assert!(denied.reset_secs >= 1 && denied.reset_secs <= 60);
        // other clients unaffected
        assert!(limiter.check("5.6.7.8").allowed);
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_window: 1,
            window_duration: Duration::from_millis(10),
            max_entries: 10,
        });
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("a").allowed);
    }

    #[test]
    fn test_store_cap_evicts() {
        let limiter = limiter(5);
        for i in 0..11 {
            limiter.check(&format!("client-{}", i));
        }
        assert!(limiter.tracked_clients() <= 10);
    }

    #[test]
    fn test_client_ip_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.3"));
        assert_eq!(client_ip(&headers), "10.0.0.3");

        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.2, 172.16.0.1"));
        assert_eq!(client_ip(&headers), "10.0.0.2");

        headers.insert("cf-connecting-ip", HeaderValue::from_static("10.0.0.1"));
        assert_eq!(client_ip(&headers), "10.0.0.1");
    }
}
