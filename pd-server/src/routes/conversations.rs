//! Conversation endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use pd_models::Conversation;

use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiQuery, AuthUser, ValidUuid};
use crate::pagination::{Page, PageParams, Paginated};
use crate::routes::blocking;
use crate::server::AppState;
use crate::views::ConversationView;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/conversations", get(list_conversations).post(create_conversation))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    /// Other members; the caller is always added.
    pub participants: Vec<Uuid>,
}

/// GET /api/conversations
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Paginated<Conversation>>, ApiError> {
    let page = Page::resolve(params, &state.pagination);
    let conversations = state.services.conversations.clone();
    let (results, count) =
        blocking(move || conversations.list_for_user(&user, page.limit(), page.offset())).await?;
    Ok(Json(Paginated::new(page, count, results)))
}

/// POST /api/conversations
async fn create_conversation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationView>), ApiError> {
    let conversations = state.services.conversations.clone();
    let detail = blocking(move || conversations.create(&user, &req.participants)).await?;
    Ok((StatusCode::CREATED, Json(ConversationView::new(detail))))
}

/// GET /api/conversations/{id}
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ConversationView>, ApiError> {
    let conversations = state.services.conversations.clone();
    let detail = blocking(move || conversations.get(&user, &id)).await?;
    Ok(Json(ConversationView::new(detail)))
}

/// DELETE /api/conversations/{id}
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let conversations = state.services.conversations.clone();
    blocking(move || conversations.delete(&user, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
