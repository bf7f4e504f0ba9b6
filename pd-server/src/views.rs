//! Response representations that embed related records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use pd_models::queries::ThreadEntry;
use pd_models::{Message, User};
use pd_services::ConversationDetail;

/// A message with its sender nested and a short preview.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub sender: Option<User>,
    pub message_preview: String,
}

impl MessageView {
    pub fn new(message: Message, senders: &HashMap<Uuid, User>) -> Self {
        Self {
            sender: senders.get(&message.sender_id).cloned(),
            message_preview: message.preview(),
            message,
        }
    }

    pub fn many(messages: Vec<Message>, senders: &HashMap<Uuid, User>) -> Vec<Self> {
        messages.into_iter().map(|m| Self::new(m, senders)).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadEntryView {
    pub depth: usize,
    pub message: MessageView,
}

impl ThreadEntryView {
    pub fn many(entries: Vec<ThreadEntry>, senders: &HashMap<Uuid, User>) -> Vec<Self> {
        entries
            .into_iter()
            .map(|entry| Self {
                depth: entry.depth,
                message: MessageView::new(entry.message, senders),
            })
            .collect()
    }
}

/// A conversation with nested participants and message views.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<User>,
    pub messages: Vec<MessageView>,
}

impl ConversationView {
    /// Senders are resolved from the participant list.
    pub fn new(detail: ConversationDetail) -> Self {
        let senders: HashMap<Uuid, User> = detail
            .participants
            .iter()
            .map(|user| (user.user_id, user.clone()))
            .collect();
        Self {
            conversation_id: detail.conversation.conversation_id,
            created_at: detail.conversation.created_at,
            messages: MessageView::many(detail.messages, &senders),
            participants: detail.participants,
        }
    }
}
