//! Token endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use pd_services::TokenPair;

use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::routes::blocking;
use crate::server::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/token", post(obtain_token))
        .route("/api/token/refresh", post(refresh_token))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// POST /api/token
async fn obtain_token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let auth = state.services.auth.clone();
    let pair = blocking(move || auth.login(&req.username, &req.password)).await?;
    Ok(Json(pair))
}

/// POST /api/token/refresh
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let access = state.services.auth.refresh(&req.refresh)?;
    Ok(Json(AccessToken { access }))
}
