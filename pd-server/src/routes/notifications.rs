//! Notification endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pd_models::Notification;

use crate::error::ApiError;
use crate::extractors::{ApiQuery, AuthUser, ValidId};
use crate::routes::blocking;
use crate::server::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}/read", post(mark_read))
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_first: bool,
}

/// GET /api/notifications
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = state.services.notifications.clone();
    let list = blocking(move || notifications.list(&user, query.unread_first)).await?;
    Ok(Json(list))
}

/// POST /api/notifications/{id}/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidId(id): ValidId,
) -> Result<Json<Notification>, ApiError> {
    let notifications = state.services.notifications.clone();
    let notification = blocking(move || notifications.mark_read(&user, id)).await?;
    Ok(Json(notification))
}
