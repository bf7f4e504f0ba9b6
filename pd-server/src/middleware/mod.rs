//! Request middleware.
//!
//! Each layer is an `axum::middleware::from_fn_with_state` function over the
//! shared [`AppState`](crate::server::AppState). [`apply`] stacks them so they
//! run in the documented order.

pub mod access_window;
pub mod auth;
pub mod request_log;
pub mod role_gate;
pub mod throttle;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::server::AppState;

/// Wrap `router` with the full middleware chain.
///
/// The last layer added runs first, so they are added in reverse.
pub fn apply(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router<Arc<AppState>> {
    router
        .layer(from_fn_with_state(state.clone(), role_gate::role_gate))
        .layer(from_fn_with_state(state.clone(), throttle::throttle))
        .layer(from_fn_with_state(state.clone(), access_window::access_window))
        .layer(from_fn_with_state(state.clone(), request_log::request_log))
        .layer(from_fn_with_state(state, auth::authenticate))
}
