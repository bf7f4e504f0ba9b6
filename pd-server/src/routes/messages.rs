//! Message endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use pd_models::{MessageFilter, MessageHistory};
use pd_services::NewMessage;

use crate::error::ApiError;
use crate::extractors::{ApiJson, ApiQuery, AuthUser, ValidUuid};
use crate::pagination::{Page, PageParams, Paginated};
use crate::routes::blocking;
use crate::server::AppState;
use crate::views::{MessageView, ThreadEntryView};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/messages", get(list_messages).post(send_message))
        .route("/api/messages/unread", get(unread_messages))
        .route(
            "/api/messages/{id}",
            get(get_message)
                .put(edit_message)
                .patch(edit_message)
                .delete(delete_message),
        )
        .route("/api/messages/{id}/thread", get(message_thread))
        .route("/api/messages/{id}/history", get(message_history))
        .route("/api/messages/{id}/read", post(mark_read))
}

/// Filters and pagination for the message list.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    /// Only conversations this user belongs to.
    pub participant: Option<Uuid>,
    pub conversation: Option<Uuid>,
    pub sent_after: Option<DateTime<Utc>>,
    pub sent_before: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl MessageQuery {
    fn split(self) -> (MessageFilter, PageParams) {
        let filter = MessageFilter {
            participant: self.participant,
            conversation: self.conversation,
            sent_after: self.sent_after,
            sent_before: self.sent_before,
        };
        let params = PageParams {
            page: self.page,
            page_size: self.page_size,
        };
        (filter, params)
    }
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub content: String,
}

/// GET /api/messages
async fn list_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiQuery(query): ApiQuery<MessageQuery>,
) -> Result<Json<Paginated<MessageView>>, ApiError> {
    let (filter, params) = query.split();
    let page = Page::resolve(params, &state.pagination);
    let messages = state.services.messages.clone();

    let (views, count) = blocking(move || {
        let (results, count) = messages.list(&user, &filter, page.limit(), page.offset())?;
        let senders = messages.senders(&results)?;
        Ok((MessageView::many(results, &senders), count))
    })
    .await?;

    Ok(Json(Paginated::new(page, count, views)))
}

/// POST /api/messages
async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(req): ApiJson<NewMessage>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let messages = state.services.messages.clone();
    let sender = user.clone();
    let message = blocking(move || messages.send(&sender, req)).await?;
    let senders = HashMap::from([(user.user_id, user)]);
    Ok((StatusCode::CREATED, Json(MessageView::new(message, &senders))))
}

/// GET /api/messages/unread
async fn unread_messages(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<MessageView>>, ApiError> {
    let messages = state.services.messages.clone();
    let views = blocking(move || {
        let unread = messages.unread(&user)?;
        let senders = messages.senders(&unread)?;
        Ok(MessageView::many(unread, &senders))
    })
    .await?;
    Ok(Json(views))
}

/// GET /api/messages/{id}
async fn get_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<MessageView>, ApiError> {
    let messages = state.services.messages.clone();
    let view = blocking(move || {
        let message = messages.get(&user, &id)?;
        let senders = messages.senders(std::slice::from_ref(&message))?;
        Ok(MessageView::new(message, &senders))
    })
    .await?;
    Ok(Json(view))
}

/// PUT/PATCH /api/messages/{id}
async fn edit_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
    ApiJson(req): ApiJson<EditMessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let messages = state.services.messages.clone();
    let view = blocking(move || {
        let message = messages.edit(&user, &id, &req.content)?;
        let senders = messages.senders(std::slice::from_ref(&message))?;
        Ok(MessageView::new(message, &senders))
    })
    .await?;
    Ok(Json(view))
}

/// DELETE /api/messages/{id}
async fn delete_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let messages = state.services.messages.clone();
    blocking(move || messages.delete(&user, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/messages/{id}/thread
async fn message_thread(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<ThreadEntryView>>, ApiError> {
    let messages = state.services.messages.clone();
    let entries = blocking(move || {
        let entries = messages.thread(&user, &id)?;
        let replies: Vec<_> = entries.iter().map(|e| e.message.clone()).collect();
        let senders = messages.senders(&replies)?;
        Ok(ThreadEntryView::many(entries, &senders))
    })
    .await?;
    Ok(Json(entries))
}

/// GET /api/messages/{id}/history
async fn message_history(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<MessageHistory>>, ApiError> {
    let messages = state.services.messages.clone();
    let history = blocking(move || messages.history(&user, &id)).await?;
    Ok(Json(history))
}

/// POST /api/messages/{id}/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<MessageView>, ApiError> {
    let messages = state.services.messages.clone();
    let view = blocking(move || {
        let message = messages.mark_read(&user, &id)?;
        let senders = messages.senders(std::slice::from_ref(&message))?;
        Ok(MessageView::new(message, &senders))
    })
    .await?;
    Ok(Json(view))
}
