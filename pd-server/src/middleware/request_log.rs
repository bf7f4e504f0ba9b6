//! Per-request access log.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::info;

use crate::extractors::CurrentUser;
use crate::server::AppState;

pub async fn request_log(State(_state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let username = request
        .extensions()
        .get::<CurrentUser>()
        .map_or("Anonymous", CurrentUser::username);
    info!(target: "prodev::requests", "User: {} - Path: {}", username, request.uri().path());
    next.run(request).await
}
