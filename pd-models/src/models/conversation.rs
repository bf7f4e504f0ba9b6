//! Conversation entity model and membership.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pd_core::error::{PdError, PdResult};

use super::user::User;
use super::{get_time, get_uuid, to_sql_time};

/// A conversation between two or more users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new, unsaved conversation.
    pub fn new() -> Self {
        Self {
            conversation_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    /// Construct a Conversation from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            conversation_id: get_uuid(row, "conversation_id")?,
            created_at: get_time(row, "created_at")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    pub fn find_by_id(conn: &Connection, id: &Uuid) -> PdResult<Option<Self>> {
        match conn.query_row(
            "SELECT * FROM conversations WHERE conversation_id = ?1",
            [id.to_string()],
            Self::from_row,
        ) {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PdError::Database(e.to_string())),
        }
    }

    /// Conversations the user participates in, newest first.
    pub fn list_for_user(
        conn: &Connection,
        user_id: &Uuid,
        limit: i64,
        offset: i64,
    ) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT c.* FROM conversations c
             JOIN conversation_participants p ON p.conversation_id = c.conversation_id
             WHERE p.user_id = ?1
             ORDER BY c.created_at DESC, c.conversation_id
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
            .query_map(params![user_id.to_string(), limit, offset], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Number of conversations the user participates in.
    pub fn count_for_user(conn: &Connection, user_id: &Uuid) -> PdResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM conversation_participants WHERE user_id = ?1",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Whether the user is a member of the conversation.
    pub fn is_participant(conn: &Connection, conversation_id: &Uuid, user_id: &Uuid) -> PdResult<bool> {
        let found: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM conversation_participants
                           WHERE conversation_id = ?1 AND user_id = ?2)",
            params![conversation_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Participants of the conversation, ordered by username.
    pub fn participants(conn: &Connection, conversation_id: &Uuid) -> PdResult<Vec<User>> {
        let mut stmt = conn.prepare(
            "SELECT u.* FROM users u
             JOIN conversation_participants p ON p.user_id = u.user_id
             WHERE p.conversation_id = ?1
             ORDER BY u.username",
        )?;
        let users = stmt
            .query_map([conversation_id.to_string()], User::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// The participant a receiver-less message from `sender` is addressed to.
    ///
    /// The earliest member to join other than the sender, or the sender
    /// itself when it is alone in the conversation.
    pub fn default_recipient(conn: &Connection, conversation_id: &Uuid, sender: &Uuid) -> PdResult<Uuid> {
        let other = conn
            .query_row(
                "SELECT user_id FROM conversation_participants
                 WHERE conversation_id = ?1 AND user_id != ?2
                 ORDER BY rowid LIMIT 1",
                params![conversation_id.to_string(), sender.to_string()],
                |row| get_uuid(row, "user_id"),
            )
            .optional()?;
        Ok(other.unwrap_or(*sender))
    }

    pub fn delete(conn: &Connection, id: &Uuid) -> PdResult<bool> {
        let changed = conn.execute(
            "DELETE FROM conversations WHERE conversation_id = ?1",
            [id.to_string()],
        )?;
        Ok(changed > 0)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn insert(&self, conn: &Connection) -> PdResult<()> {
        conn.execute(
            "INSERT INTO conversations (conversation_id, created_at) VALUES (?1, ?2)",
            params![self.conversation_id.to_string(), to_sql_time(&self.created_at)],
        )?;
        Ok(())
    }

    /// Add a member. Adding an existing member is a no-op.
    pub fn add_participant(&self, conn: &Connection, user_id: &Uuid) -> PdResult<()> {
        conn.execute(
            "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id)
             VALUES (?1, ?2)",
            params![self.conversation_id.to_string(), user_id.to_string()],
        )?;
        Ok(())
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn setup() -> (Connection, User, User) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        schema::create_tables(&conn).unwrap();
        let alice = User::new("alice", "alice@example.com", "h".into());
        let bob = User::new("bob", "bob@example.com", "h".into());
        alice.insert(&conn).unwrap();
        bob.insert(&conn).unwrap();
        (conn, alice, bob)
    }

    #[test]
    fn test_membership() {
        let (conn, alice, bob) = setup();
        let conv = Conversation::new();
        conv.insert(&conn).unwrap();
        conv.add_participant(&conn, &alice.user_id).unwrap();
        conv.add_participant(&conn, &alice.user_id).unwrap();
        conv.add_participant(&conn, &bob.user_id).unwrap();

        let members = Conversation::participants(&conn, &conv.conversation_id).unwrap();
        let names: Vec<_> = members.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        assert!(Conversation::is_participant(&conn, &conv.conversation_id, &bob.user_id).unwrap());
        let recipient =
            Conversation::default_recipient(&conn, &conv.conversation_id, &alice.user_id).unwrap();
        assert_eq!(recipient, bob.user_id);
    }

    #[test]
    fn test_default_recipient_of_solo_conversation_is_sender() {
        let (conn, alice, _) = setup();
        let conv = Conversation::new();
        conv.insert(&conn).unwrap();
        conv.add_participant(&conn, &alice.user_id).unwrap();

        let recipient =
            Conversation::default_recipient(&conn, &conv.conversation_id, &alice.user_id).unwrap();
        assert_eq!(recipient, alice.user_id);
    }

    #[test]
    fn test_list_for_user_only_returns_own() {
        let (conn, alice, bob) = setup();
        let shared = Conversation::new();
        shared.insert(&conn).unwrap();
        shared.add_participant(&conn, &alice.user_id).unwrap();
        shared.add_participant(&conn, &bob.user_id).unwrap();

        let solo = Conversation::new();
        solo.insert(&conn).unwrap();
        solo.add_participant(&conn, &bob.user_id).unwrap();

        assert_eq!(Conversation::count_for_user(&conn, &alice.user_id).unwrap(), 1);
        assert_eq!(Conversation::count_for_user(&conn, &bob.user_id).unwrap(), 2);
        let page = Conversation::list_for_user(&conn, &alice.user_id, 10, 0).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].conversation_id, shared.conversation_id);
    }

    #[test]
    fn test_deleting_user_removes_membership() {
        let (conn, alice, _bob) = setup();
        let conv = Conversation::new();
        conv.insert(&conn).unwrap();
        conv.add_participant(&conn, &alice.user_id).unwrap();

        User::delete(&conn, &alice.user_id).unwrap();
        assert!(Conversation::participants(&conn, &conv.conversation_id).unwrap().is_empty());
    }
}
