//! User registration and account endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use pd_models::User;
use pd_services::NewUser;

use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, ValidUuid};
use crate::routes::blocking;
use crate::server::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(register))
        .route("/api/users/me", get(me))
        .route("/api/users/{id}", delete(delete_user))
}

/// POST /api/users
async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let users = state.services.users.clone();
    let user = blocking(move || users.register(req)).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/me
async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let users = state.services.users.clone();
    blocking(move || users.delete(&user, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
