//! API route handlers.

pub mod admin;
pub mod auth;
pub mod conversations;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod users;

use pd_core::error::PdResult;

use crate::error::ApiError;

/// Run synchronous service code off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> PdResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(ApiError::from)
}
