//! Sending, editing and reading messages.
//!
//! Writes run in one transaction together with the save hooks. Events are
//! emitted only after the commit succeeded.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use pd_core::error::{PdError, PdResult};
use pd_models::queries::{self, ThreadEntry};
use pd_models::{Conversation, Database, Message, MessageFilter, MessageHistory, User};

use crate::conversation::{load_for_participant, require_participant};
use crate::event_bus::{AppEvent, EventBus};
use crate::signals::{HookChain, MessageHooks};

/// Payload for sending a message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub receiver_id: Option<Uuid>,
    #[serde(default)]
    pub parent_message_id: Option<Uuid>,
}

impl NewMessage {
    pub fn new(conversation_id: Uuid, content: &str) -> Self {
        Self {
            conversation_id,
            content: content.to_string(),
            receiver_id: None,
            parent_message_id: None,
        }
    }
}

fn require_content(content: &str) -> PdResult<()> {
    if content.trim().is_empty() {
        return Err(PdError::Validation("content must not be empty".into()));
    }
    Ok(())
}

pub struct MessageService {
    database: Database,
    event_bus: EventBus,
    hooks: Arc<dyn MessageHooks>,
}

impl MessageService {
    /// Service with the default hooks (notifications and edit history).
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self::with_hooks(database, event_bus, Arc::new(HookChain::default()))
    }

    pub fn with_hooks(database: Database, event_bus: EventBus, hooks: Arc<dyn MessageHooks>) -> Self {
        Self {
            database,
            event_bus,
            hooks,
        }
    }

    /// Store a message from `sender`.
    ///
    /// The sender and the optional receiver must belong to the conversation.
    /// A parent must exist in the same conversation.
    pub fn send(&self, sender: &User, new: NewMessage) -> PdResult<Message> {
        require_content(&new.content)?;

        let (message, events) = self.database.transaction(|conn| {
            load_for_participant(conn, &new.conversation_id, &sender.user_id)?;

            if let Some(receiver) = &new.receiver_id {
                if !Conversation::is_participant(conn, &new.conversation_id, receiver)? {
                    return Err(PdError::Validation(
                        "receiver is not a participant of this conversation".into(),
                    ));
                }
            }
            if let Some(parent_id) = &new.parent_message_id {
                let parent = Message::find_by_id(conn, parent_id)?
                    .ok_or_else(|| PdError::Validation(format!("parent message {parent_id} does not exist")))?;
                if parent.conversation_id != new.conversation_id {
                    return Err(PdError::Validation(
                        "parent message belongs to another conversation".into(),
                    ));
                }
            }

            let message = Message::new(new.conversation_id, sender.user_id, &new.content)
                .with_receiver(new.receiver_id)
                .with_parent(new.parent_message_id);
            message.insert(conn)?;

            let mut events = vec![AppEvent::MessageCreated {
                message_id: message.message_id,
                conversation_id: message.conversation_id,
                sender_id: message.sender_id,
            }];
            self.hooks.after_create(conn, &message, &mut events)?;
            Ok((message, events))
        })?;

        info!("{} sent message {}", sender.username, message.message_id);
        self.event_bus.emit_all(events);
        Ok(message)
    }

    /// A message visible to `viewer`.
    pub fn get(&self, viewer: &User, message_id: &Uuid) -> PdResult<Message> {
        let conn = self.database.conn()?;
        Self::load_visible(&conn, message_id, viewer)
    }

    /// Replace the content of a message. Unchanged content is a no-op.
    pub fn edit(&self, editor: &User, message_id: &Uuid, content: &str) -> PdResult<Message> {
        require_content(content)?;

        let (message, events) = self.database.transaction(|conn| {
            let mut message = Self::load_visible(conn, message_id, editor)?;
            let mut events = Vec::new();
            if message.content == content {
                return Ok((message, events));
            }

            self.hooks
                .before_update(conn, &message, content, &editor.user_id, &mut events)?;
            message.update_content(conn, content, Utc::now())?;
            events.push(AppEvent::MessageEdited {
                message_id: message.message_id,
                editor_id: editor.user_id,
            });
            Ok((message, events))
        })?;

        if !events.is_empty() {
            info!("{} edited message {message_id}", editor.username);
        }
        self.event_bus.emit_all(events);
        Ok(message)
    }

    /// Delete a message and, through the cascade, its replies.
    pub fn delete(&self, viewer: &User, message_id: &Uuid) -> PdResult<()> {
        let conn = self.database.conn()?;
        let message = Self::load_visible(&conn, message_id, viewer)?;
        Message::delete(&conn, message_id)?;

        info!("{} deleted message {message_id}", viewer.username);
        self.event_bus.emit(AppEvent::MessageDeleted {
            message_id: *message_id,
            conversation_id: message.conversation_id,
        });
        Ok(())
    }

    /// One page of the messages visible to `viewer` and the total count.
    pub fn list(
        &self,
        viewer: &User,
        filter: &MessageFilter,
        limit: i64,
        offset: i64,
    ) -> PdResult<(Vec<Message>, i64)> {
        let conn = self.database.conn()?;
        let page = queries::list_messages_for_user(&conn, &viewer.user_id, filter, limit, offset)?;
        let total = queries::count_messages_for_user(&conn, &viewer.user_id, filter)?;
        Ok((page, total))
    }

    /// All replies below a message, depth-first.
    pub fn thread(&self, viewer: &User, message_id: &Uuid) -> PdResult<Vec<ThreadEntry>> {
        let conn = self.database.conn()?;
        Self::load_visible(&conn, message_id, viewer)?;
        queries::thread(&conn, message_id)
    }

    /// Messages addressed to `user` that are still unread.
    pub fn unread(&self, user: &User) -> PdResult<Vec<Message>> {
        let conn = self.database.conn()?;
        Message::unread_for_user(&conn, &user.user_id)
    }

    /// Mark a message read. Only its receiver may do this.
    pub fn mark_read(&self, user: &User, message_id: &Uuid) -> PdResult<Message> {
        let conn = self.database.conn()?;
        let mut message = Message::find_by_id(&conn, message_id)?
            .ok_or_else(|| PdError::not_found("message", message_id))?;
        if message.receiver_id != Some(user.user_id) {
            return Err(PdError::PermissionDenied(
                "only the receiver can mark a message as read".into(),
            ));
        }
        if !message.read {
            message.mark_read(&conn)?;
            debug!("message {message_id} read by {}", user.username);
        }
        Ok(message)
    }

    /// Previous contents of a message, newest first.
    pub fn history(&self, viewer: &User, message_id: &Uuid) -> PdResult<Vec<MessageHistory>> {
        let conn = self.database.conn()?;
        Self::load_visible(&conn, message_id, viewer)?;
        MessageHistory::list_for_message(&conn, message_id)
    }

    /// Senders of `messages`, keyed by user id.
    pub fn senders(&self, messages: &[Message]) -> PdResult<HashMap<Uuid, User>> {
        let conn = self.database.conn()?;
        queries::load_senders(&conn, messages)
    }

    fn load_visible(conn: &Connection, message_id: &Uuid, viewer: &User) -> PdResult<Message> {
        let message = Message::find_by_id(conn, message_id)?
            .ok_or_else(|| PdError::not_found("message", message_id))?;
        require_participant(conn, &message.conversation_id, &viewer.user_id)?;
        Ok(message)
    }
}
