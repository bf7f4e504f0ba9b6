//! prodev Models - Messaging schema, models, migrations, and queries.
//!
//! This crate owns persistence for the messaging service: SQLite database
//! initialization with pooling, entity models for users, conversations,
//! threaded messages, notifications and edit history, versioned migrations,
//! and query helpers for filtered and paginated access.

pub mod db;
pub mod schema;
pub mod models;
pub mod queries;
pub mod migrations;

// Re-export key types
pub use db::{Database, DatabaseStats, DbPool};
pub use models::user::{Role, User};
pub use models::conversation::Conversation;
pub use models::message::Message;
pub use models::notification::Notification;
pub use models::message_history::MessageHistory;
pub use queries::MessageFilter;
