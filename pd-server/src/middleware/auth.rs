//! Bearer token authentication.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::extractors::CurrentUser;
use crate::server::AppState;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Attach the token's user as a [`CurrentUser`] extension.
///
/// Missing or invalid tokens leave the request anonymous; handlers that need
/// a user reject it themselves.
pub async fn authenticate(State(state): State<Arc<AppState>>, mut request: Request, next: Next) -> Response {
    let user = match bearer_token(&request).map(str::to_owned) {
        Some(token) => {
            let auth = state.services.auth.clone();
            match tokio::task::spawn_blocking(move || auth.authenticate(&token)).await {
                Ok(Ok(user)) => Some(user),
                Ok(Err(e)) => {
                    debug!("bearer token rejected: {e}");
                    None
                }
                Err(e) => {
                    debug!("authentication task failed: {e}");
                    None
                }
            }
        }
        None => None,
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}
