//! Save hooks for messages.
//!
//! Hooks run on the transaction that writes the message, so their writes
//! commit or roll back together with it. Events they want published are
//! pushed onto `events` and emitted by the caller after the commit.

use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use pd_core::error::PdResult;
use pd_models::{Conversation, Message, MessageHistory, Notification};

use crate::event_bus::AppEvent;

/// Callbacks around message persistence.
pub trait MessageHooks: Send + Sync {
    /// Called after a new message row is inserted.
    fn after_create(&self, _conn: &Connection, _message: &Message, _events: &mut Vec<AppEvent>) -> PdResult<()> {
        Ok(())
    }

    /// Called before `message` is updated to `new_content` by `editor`.
    ///
    /// `message` still holds the stored content.
    fn before_update(
        &self,
        _conn: &Connection,
        _message: &Message,
        _new_content: &str,
        _editor: &Uuid,
        _events: &mut Vec<AppEvent>,
    ) -> PdResult<()> {
        Ok(())
    }
}

/// Notifies the recipient of a new message.
///
/// Every new message produces exactly one notification: for its receiver
/// when one is set, otherwise for the conversation's default recipient.
#[derive(Debug, Default)]
pub struct NotificationHook;

impl MessageHooks for NotificationHook {
    fn after_create(&self, conn: &Connection, message: &Message, events: &mut Vec<AppEvent>) -> PdResult<()> {
        let user_id = match message.receiver_id {
            Some(receiver) => receiver,
            None => Conversation::default_recipient(conn, &message.conversation_id, &message.sender_id)?,
        };

        let mut notification = Notification::new(user_id, message.message_id);
        let notification_id = notification.insert(conn)?;
        debug!("notified {user_id} about message {}", message.message_id);
        events.push(AppEvent::NotificationCreated {
            notification_id,
            user_id,
            message_id: message.message_id,
        });
        Ok(())
    }
}

/// Keeps the previous content of edited messages.
#[derive(Debug, Default)]
pub struct HistoryHook;

impl MessageHooks for HistoryHook {
    fn before_update(
        &self,
        conn: &Connection,
        message: &Message,
        new_content: &str,
        editor: &Uuid,
        _events: &mut Vec<AppEvent>,
    ) -> PdResult<()> {
        if message.content == new_content {
            return Ok(());
        }
        let mut entry = MessageHistory::new(message.message_id, &message.content, Some(*editor), Utc::now());
        entry.insert(conn)?;
        debug!("recorded history for message {}", message.message_id);
        Ok(())
    }
}

/// Runs hooks in registration order and stops at the first error.
#[derive(Clone)]
pub struct HookChain {
    hooks: Vec<Arc<dyn MessageHooks>>,
}

impl HookChain {
    pub fn empty() -> Self {
        Self { hooks: Vec::new() }
    }

    pub fn with(mut self, hook: impl MessageHooks + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl Default for HookChain {
    /// Notifications and edit history.
    fn default() -> Self {
        Self::empty().with(NotificationHook).with(HistoryHook)
    }
}

impl MessageHooks for HookChain {
    fn after_create(&self, conn: &Connection, message: &Message, events: &mut Vec<AppEvent>) -> PdResult<()> {
        for hook in &self.hooks {
            hook.after_create(conn, message, events)?;
        }
        Ok(())
    }

    fn before_update(
        &self,
        conn: &Connection,
        message: &Message,
        new_content: &str,
        editor: &Uuid,
        events: &mut Vec<AppEvent>,
    ) -> PdResult<()> {
        for hook in &self.hooks {
            hook.before_update(conn, message, new_content, editor, events)?;
        }
        Ok(())
    }
}
