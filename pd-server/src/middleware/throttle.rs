//! Per-IP throttling of message posts.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use tracing::warn;

use pd_core::config::MiddlewareConfig;

use crate::error::ApiError;
use crate::server::AppState;

/// Used when neither a forwarded header nor a peer address is available.
pub const UNKNOWN_CLIENT_IP: &str = "0.0.0.0";

/// Sliding-window request counter keyed by client IP.
///
/// Each key keeps the timestamps of its accepted requests. Timestamps older
/// than the window are dropped on every check.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &MiddlewareConfig) -> Self {
        Self::new(config.rate_limit, Duration::from_secs(config.rate_window_secs))
    }

    /// Record a request from `key` at `now`. False if it exceeds the limit;
    /// rejected requests are not recorded.
    ///
    /// Keys whose window has fully drained are forgotten.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock();
        hits.retain(|_, stamps| {
            while stamps
                .front()
                .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= self.window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });

        let recorded = hits.get(key).map_or(0, VecDeque::len);
        if recorded >= self.limit {
            return false;
        }
        hits.entry(key.to_string()).or_default().push_back(now);
        true
    }

    /// Requests from `key` still inside the window as of the last check.
    pub fn recorded(&self, key: &str) -> usize {
        self.hits.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Number of client keys currently held.
    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().len()
    }
}

/// First `X-Forwarded-For` entry, else the peer address, else `0.0.0.0`.
pub fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT_IP.to_string())
}

/// Reject throttled `POST`s over the limit with 429.
pub async fn throttle(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let fragment = state.middleware.throttled_path_fragment.as_str();
    if request.method() == Method::POST && request.uri().path().contains(fragment) {
        let ip = client_ip(&request);
        if !state.rate_limiter.check(&ip, Instant::now()) {
            warn!("rate limit exceeded for {ip} on {}", request.uri().path());
            return ApiError::TooManyRequests.into_response();
        }
    }
    next.run(request).await
}
