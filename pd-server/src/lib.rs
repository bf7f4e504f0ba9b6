//! prodev Server - REST API for the messaging service.
//!
//! Routes are grouped by resource under `/api`. Every request passes the
//! middleware chain in this order:
//! 1. authentication (attaches the bearer token's user, never rejects)
//! 2. request logging
//! 3. access time window
//! 4. per-IP throttling of message posts
//! 5. role gate for admin actions

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod pagination;
pub mod routes;
pub mod server;
pub mod views;

// Re-export key types
pub use error::ApiError;
pub use middleware::access_window::AccessWindow;
pub use middleware::throttle::RateLimiter;
pub use server::{build_router, run_server, AppState};
