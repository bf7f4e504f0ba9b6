//! Message entity model.
//!
//! Messages belong to a conversation and may reply to another message of the
//! same conversation through `parent_message_id`, forming threads.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pd_core::constants::MESSAGE_PREVIEW_CHARS;
use pd_core::error::{PdError, PdResult};

use super::{get_opt_time, get_opt_uuid, get_time, get_uuid, to_sql_time};

/// A message sent in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Option<Uuid>,
    pub parent_message_id: Option<Uuid>,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
    pub edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Create a new, unsaved message.
    pub fn new(conversation_id: Uuid, sender_id: Uuid, content: &str) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            receiver_id: None,
            parent_message_id: None,
            content: content.to_string(),
            sent_at: Utc::now(),
            read: false,
            edited: false,
            edited_at: None,
        }
    }

    pub fn with_receiver(mut self, receiver_id: Option<Uuid>) -> Self {
        self.receiver_id = receiver_id;
        self
    }

    pub fn with_parent(mut self, parent_message_id: Option<Uuid>) -> Self {
        self.parent_message_id = parent_message_id;
        self
    }

    /// Construct a Message from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            message_id: get_uuid(row, "message_id")?,
            conversation_id: get_uuid(row, "conversation_id")?,
            sender_id: get_uuid(row, "sender_id")?,
            receiver_id: get_opt_uuid(row, "receiver_id")?,
            parent_message_id: get_opt_uuid(row, "parent_message_id")?,
            content: row.get("content")?,
            sent_at: get_time(row, "sent_at")?,
            read: row.get::<_, i32>("read")? != 0,
            edited: row.get::<_, i32>("edited")? != 0,
            edited_at: get_opt_time(row, "edited_at")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    pub fn find_by_id(conn: &Connection, id: &Uuid) -> PdResult<Option<Self>> {
        match conn.query_row(
            "SELECT * FROM messages WHERE message_id = ?1",
            [id.to_string()],
            Self::from_row,
        ) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PdError::Database(e.to_string())),
        }
    }

    /// Direct replies to a message, oldest first.
    pub fn replies(conn: &Connection, parent_id: &Uuid) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE parent_message_id = ?1
             ORDER BY sent_at, message_id",
        )?;
        let rows = stmt
            .query_map([parent_id.to_string()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Messages of a conversation, oldest first.
    pub fn list_for_conversation(conn: &Connection, conversation_id: &Uuid) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE conversation_id = ?1
             ORDER BY sent_at, message_id",
        )?;
        let rows = stmt
            .query_map([conversation_id.to_string()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Unread messages addressed to a user, oldest first.
    pub fn unread_for_user(conn: &Connection, user_id: &Uuid) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM messages WHERE receiver_id = ?1 AND read = 0
             ORDER BY sent_at, message_id",
        )?;
        let rows = stmt
            .query_map([user_id.to_string()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete(conn: &Connection, id: &Uuid) -> PdResult<bool> {
        let changed = conn.execute("DELETE FROM messages WHERE message_id = ?1", [id.to_string()])?;
        Ok(changed > 0)
    }

    // ─── Computed properties ─────────────────────────────────────────────

    /// First characters of the content.
    pub fn preview(&self) -> String {
        self.content.chars().take(MESSAGE_PREVIEW_CHARS).collect()
    }

    /// Whether this message replies to another one.
    pub fn is_reply(&self) -> bool {
        self.parent_message_id.is_some()
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(&self, conn: &Connection) -> PdResult<()> {
        conn.execute(
            "INSERT INTO messages (
                message_id, conversation_id, sender_id, receiver_id,
                parent_message_id, content, sent_at, read, edited, edited_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                self.message_id.to_string(),
                self.conversation_id.to_string(),
                self.sender_id.to_string(),
                self.receiver_id.map(|id| id.to_string()),
                self.parent_message_id.map(|id| id.to_string()),
                self.content,
                to_sql_time(&self.sent_at),
                self.read as i32,
                self.edited as i32,
                self.edited_at.as_ref().map(to_sql_time),
            ],
        )?;
        Ok(())
    }

    /// Store new content and flag the message as edited.
    pub fn update_content(&mut self, conn: &Connection, content: &str, at: DateTime<Utc>) -> PdResult<()> {
        conn.execute(
            "UPDATE messages SET content = ?1, edited = 1, edited_at = ?2 WHERE message_id = ?3",
            params![content, to_sql_time(&at), self.message_id.to_string()],
        )?;
        self.content = content.to_string();
        self.edited = true;
        self.edited_at = Some(at);
        Ok(())
    }

    pub fn mark_read(&mut self, conn: &Connection) -> PdResult<()> {
        conn.execute(
            "UPDATE messages SET read = 1 WHERE message_id = ?1",
            [self.message_id.to_string()],
        )?;
        self.read = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::conversation::Conversation;
    use crate::models::user::User;
    use crate::schema;

    fn setup() -> (Connection, Conversation, User, User) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        schema::create_tables(&conn).unwrap();
        let alice = User::new("alice", "alice@example.com", "h".into());
        let bob = User::new("bob", "bob@example.com", "h".into());
        alice.insert(&conn).unwrap();
        bob.insert(&conn).unwrap();
        let conv = Conversation::new();
        conv.insert(&conn).unwrap();
        conv.add_participant(&conn, &alice.user_id).unwrap();
        conv.add_participant(&conn, &bob.user_id).unwrap();
        (conn, conv, alice, bob)
    }

    #[test]
    fn test_insert_and_find() {
        let (conn, conv, alice, bob) = setup();
        let msg = Message::new(conv.conversation_id, alice.user_id, "hello bob")
            .with_receiver(Some(bob.user_id));
        msg.insert(&conn).unwrap();

        let found = Message::find_by_id(&conn, &msg.message_id).unwrap().unwrap();
        assert_eq!(found.content, "hello bob");
        assert_eq!(found.receiver_id, Some(bob.user_id));
        assert!(!found.read);
        assert!(!found.edited);
    }

    #[test]
    fn test_preview_counts_characters() {
        let msg = Message::new(Uuid::new_v4(), Uuid::new_v4(), "ééééééééééééééééééééééé");
        assert_eq!(msg.preview().chars().count(), 20);
        let short = Message::new(Uuid::new_v4(), Uuid::new_v4(), "hi");
        assert_eq!(short.preview(), "hi");
    }

    #[test]
    fn test_update_content_sets_edited() {
        let (conn, conv, alice, _bob) = setup();
        let mut msg = Message::new(conv.conversation_id, alice.user_id, "draft");
        msg.insert(&conn).unwrap();
        msg.update_content(&conn, "final", Utc::now()).unwrap();

        let found = Message::find_by_id(&conn, &msg.message_id).unwrap().unwrap();
        assert_eq!(found.content, "final");
        assert!(found.edited);
        assert!(found.edited_at.is_some());
    }

    #[test]
    fn test_unread_and_mark_read() {
        let (conn, conv, alice, bob) = setup();
        let mut msg = Message::new(conv.conversation_id, alice.user_id, "ping")
            .with_receiver(Some(bob.user_id));
        msg.insert(&conn).unwrap();

        assert_eq!(Message::unread_for_user(&conn, &bob.user_id).unwrap().len(), 1);
        assert!(Message::unread_for_user(&conn, &alice.user_id).unwrap().is_empty());

        msg.mark_read(&conn).unwrap();
        assert!(Message::unread_for_user(&conn, &bob.user_id).unwrap().is_empty());
    }

    #[test]
    fn test_replies_ordered_by_sent_at() {
        let (conn, conv, alice, bob) = setup();
        let root = Message::new(conv.conversation_id, alice.user_id, "root");
        root.insert(&conn).unwrap();

        let mut late = Message::new(conv.conversation_id, bob.user_id, "late")
            .with_parent(Some(root.message_id));
        late.sent_at = root.sent_at + chrono::Duration::seconds(10);
        let mut early = Message::new(conv.conversation_id, alice.user_id, "early")
            .with_parent(Some(root.message_id));
        early.sent_at = root.sent_at + chrono::Duration::seconds(5);
        late.insert(&conn).unwrap();
        early.insert(&conn).unwrap();

        let replies = Message::replies(&conn, &root.message_id).unwrap();
        let contents: Vec<_> = replies.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["early", "late"]);
    }
}
