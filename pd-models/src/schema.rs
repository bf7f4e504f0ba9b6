//! Database schema definitions and table creation.
//!
//! Identifiers are UUID strings and timestamps are fixed-width RFC 3339
//! strings in UTC, so text ordering matches chronological ordering.

use rusqlite::Connection;
use pd_core::error::{PdError, PdResult};
use tracing::info;

/// Create all database tables if they do not exist.
pub fn create_tables(conn: &Connection) -> PdResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| PdError::Database(format!("failed to create schema: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> PdResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS message_history;
         DROP TABLE IF EXISTS notifications;
         DROP TABLE IF EXISTS messages;
         DROP TABLE IF EXISTS conversation_participants;
         DROP TABLE IF EXISTS conversations;
         DROP TABLE IF EXISTS users;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| PdError::Database(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Complete SQL schema for all tables.
const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

-- Users
CREATE TABLE IF NOT EXISTS users (
    user_id         TEXT PRIMARY KEY,
    username        TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL,
    first_name      TEXT NOT NULL DEFAULT '',
    last_name       TEXT NOT NULL DEFAULT '',
    phone_number    TEXT CHECK (phone_number IS NULL OR length(phone_number) <= 20),
    role            TEXT NOT NULL DEFAULT 'guest'
                    CHECK (role IN ('guest', 'host', 'admin', 'moderator')),
    password_hash   TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

-- Conversations
CREATE TABLE IF NOT EXISTS conversations (
    conversation_id TEXT PRIMARY KEY,
    created_at      TEXT NOT NULL
);

-- Conversation membership
CREATE TABLE IF NOT EXISTS conversation_participants (
    conversation_id TEXT NOT NULL REFERENCES conversations(conversation_id) ON DELETE CASCADE,
    user_id         TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    PRIMARY KEY (conversation_id, user_id)
);

-- Messages, threaded through parent_message_id
CREATE TABLE IF NOT EXISTS messages (
    message_id          TEXT PRIMARY KEY,
    conversation_id     TEXT NOT NULL REFERENCES conversations(conversation_id) ON DELETE CASCADE,
    sender_id           TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    receiver_id         TEXT REFERENCES users(user_id) ON DELETE CASCADE,
    parent_message_id   TEXT REFERENCES messages(message_id) ON DELETE CASCADE,
    content             TEXT NOT NULL,
    sent_at             TEXT NOT NULL,
    read                INTEGER NOT NULL DEFAULT 0,
    edited              INTEGER NOT NULL DEFAULT 0,
    edited_at           TEXT
);

-- Notifications created when a message is sent
CREATE TABLE IF NOT EXISTS notifications (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    message_id  TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    is_read     INTEGER NOT NULL DEFAULT 0
);

-- Previous contents of edited messages
CREATE TABLE IF NOT EXISTS message_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id  TEXT NOT NULL REFERENCES messages(message_id) ON DELETE CASCADE,
    old_content TEXT NOT NULL,
    edited_at   TEXT NOT NULL,
    edited_by   TEXT REFERENCES users(user_id) ON DELETE SET NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let tables = ["users", "conversations", "conversation_participants", "messages",
                       "notifications", "message_history", "schema_version"];
        for table in &tables {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='{table}'"),
                    [],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {table} should exist");
        }
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_phone_number_length_checked() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO users (user_id, username, email, phone_number, password_hash, created_at)
             VALUES ('u', 'u', 'u@x.io', '012345678901234567890', 'h', 't')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_and_recreate() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        drop_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='messages'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
