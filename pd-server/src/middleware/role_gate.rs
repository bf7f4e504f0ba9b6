//! Role check for administrative paths.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::server::AppState;

/// Paths containing the restricted fragment need one of the allowed roles.
/// Anonymous callers are rejected with 403 as well.
pub async fn role_gate(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let config = &state.middleware;
    if request.uri().path().contains(config.restricted_path_fragment.as_str()) {
        let allowed = request
            .extensions()
            .get::<CurrentUser>()
            .and_then(|current| current.0.as_ref())
            .is_some_and(|user| user.has_any_role(&config.allowed_roles));
        if !allowed {
            return ApiError::Forbidden(format!(
                "this action requires one of the roles: {}",
                config.allowed_roles.join(", ")
            ))
            .into_response();
        }
    }
    next.run(request).await
}
