//! Notification entity model.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pd_core::error::{PdError, PdResult};

use super::{get_time, get_uuid, to_sql_time};

/// Tells a user that a message was sent to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Option<i64>,
    pub user_id: Uuid,
    pub message_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl Notification {
    pub fn new(user_id: Uuid, message_id: Uuid) -> Self {
        Self {
            id: None,
            user_id,
            message_id,
            created_at: Utc::now(),
            is_read: false,
        }
    }

    /// Construct a Notification from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: get_uuid(row, "user_id")?,
            message_id: get_uuid(row, "message_id")?,
            created_at: get_time(row, "created_at")?,
            is_read: row.get::<_, i32>("is_read")? != 0,
        })
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> PdResult<Option<Self>> {
        match conn.query_row("SELECT * FROM notifications WHERE id = ?1", [id], Self::from_row) {
            Ok(n) => Ok(Some(n)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PdError::Database(e.to_string())),
        }
    }

    /// Notifications of a user, newest first. With `unread_first`, unread
    /// ones are listed before read ones.
    pub fn list_for_user(conn: &Connection, user_id: &Uuid, unread_first: bool) -> PdResult<Vec<Self>> {
        let order = if unread_first {
            "is_read ASC, created_at DESC, id DESC"
        } else {
            "created_at DESC, id DESC"
        };
        let sql = format!("SELECT * FROM notifications WHERE user_id = ?1 ORDER BY {order}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([user_id.to_string()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Notifications created for a message.
    pub fn list_for_message(conn: &Connection, message_id: &Uuid) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM notifications WHERE message_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map([message_id.to_string()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_unread(conn: &Connection, user_id: &Uuid) -> PdResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Insert and return the new row id.
    pub fn insert(&mut self, conn: &Connection) -> PdResult<i64> {
        conn.execute(
            "INSERT INTO notifications (user_id, message_id, created_at, is_read)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.user_id.to_string(),
                self.message_id.to_string(),
                to_sql_time(&self.created_at),
                self.is_read as i32,
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn mark_read(conn: &Connection, id: i64) -> PdResult<bool> {
        let changed = conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}
