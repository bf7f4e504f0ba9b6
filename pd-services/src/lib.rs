//! prodev Services - Messaging business logic.
//!
//! This crate sits between the HTTP layer and the models:
//! - Users (registration, credentials, self-deletion)
//! - Conversations (creation with participants, access checks)
//! - Messages (send, edit with history, threads, unread, filters)
//! - Notifications (listing, mark read)
//! - Save hooks run inside the write transaction
//! - Event bus for post-commit fan-out
//! - Password hashing and JWT issuing

pub mod auth;
pub mod conversation;
pub mod event_bus;
pub mod message;
pub mod notification;
pub mod registry;
pub mod signals;
pub mod user;

// Re-export key types
pub use auth::{hash_password, verify_password, AuthService, Claims, JwtService, TokenPair, TokenType};
pub use conversation::{ConversationDetail, ConversationService};
pub use event_bus::{AppEvent, EventBus};
pub use message::{MessageService, NewMessage};
pub use notification::NotificationService;
pub use registry::Services;
pub use signals::{HistoryHook, HookChain, MessageHooks, NotificationHook};
pub use user::{NewUser, UserService};
