//! Daily access time window.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{Local, NaiveTime};

use pd_core::config::MiddlewareConfig;
use pd_core::error::{PdError, PdResult};

use crate::error::ApiError;
use crate::server::AppState;

/// Paths that are reachable at any time.
const EXEMPT_PATHS: &[&str] = &["/health"];

/// Inclusive `[start, end]` time-of-day range.
///
/// When `start` is after `end` the window wraps midnight, so `22:00-02:00`
/// allows late evening and early morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl AccessWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse `HH:MM` (or `HH:MM:SS`) bounds.
    pub fn parse(start: &str, end: &str) -> PdResult<Self> {
        Ok(Self::new(parse_time(start)?, parse_time(end)?))
    }

    /// The window configured for the server, or `None` when not enforced.
    pub fn from_config(config: &MiddlewareConfig) -> PdResult<Option<Self>> {
        if !config.enforce_access_window {
            return Ok(None);
        }
        Self::parse(&config.access_window_start, &config.access_window_end).map(Some)
    }

    pub fn allows(&self, at: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= at && at <= self.end
        } else {
            at >= self.start || at <= self.end
        }
    }

    pub fn describe(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn parse_time(value: &str) -> PdResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|_| PdError::Config(format!("invalid time of day: {value}")))
}

/// Reject requests outside the configured window with 403.
pub async fn access_window(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    if let Some(window) = state.access_window {
        let path = request.uri().path();
        if !EXEMPT_PATHS.contains(&path) && !window.allows(Local::now().time()) {
            return ApiError::Forbidden(format!(
                "the service is only available between {}",
                window.describe()
            ))
            .into_response();
        }
    }
    next.run(request).await
}
