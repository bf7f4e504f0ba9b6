//! Typed event bus for post-commit notifications.
//!
//! Services emit an event after their transaction commits. Subscribers are
//! decoupled from the services and may come and go freely.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Application-level state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A message was stored.
    MessageCreated {
        message_id: Uuid,
        conversation_id: Uuid,
        sender_id: Uuid,
    },
    /// A message's content changed.
    MessageEdited {
        message_id: Uuid,
        editor_id: Uuid,
    },
    MessageDeleted {
        message_id: Uuid,
        conversation_id: Uuid,
    },
    /// A recipient was notified about a message.
    NotificationCreated {
        notification_id: i64,
        user_id: Uuid,
        message_id: Uuid,
    },
    ConversationCreated {
        conversation_id: Uuid,
        participant_count: usize,
    },
    UserDeleted {
        user_id: Uuid,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Every subscriber gets every event. Subscribers that fall behind receive
/// a `Lagged` error and miss the overwritten events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => debug!("event_bus: emitted {label} to {count} subscriber(s)"),
            Err(_) => debug!("event_bus: no subscribers for {label}"),
        }
    }

    /// Emit events in order.
    pub fn emit_all(&self, events: impl IntoIterator<Item = AppEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::MessageCreated { .. } => "MessageCreated",
        AppEvent::MessageEdited { .. } => "MessageEdited",
        AppEvent::MessageDeleted { .. } => "MessageDeleted",
        AppEvent::NotificationCreated { .. } => "NotificationCreated",
        AppEvent::ConversationCreated { .. } => "ConversationCreated",
        AppEvent::UserDeleted { .. } => "UserDeleted",
    }
}
