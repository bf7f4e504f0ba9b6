//! Message edit history model.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pd_core::error::PdResult;

use super::{get_opt_uuid, get_time, get_uuid, to_sql_time};

/// Content a message held before an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHistory {
    pub id: Option<i64>,
    pub message_id: Uuid,
    pub old_content: String,
    pub edited_at: DateTime<Utc>,
    /// Editor, or `None` once that account is deleted.
    pub edited_by: Option<Uuid>,
}

impl MessageHistory {
    pub fn new(message_id: Uuid, old_content: &str, edited_by: Option<Uuid>, edited_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            message_id,
            old_content: old_content.to_string(),
            edited_at,
            edited_by,
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            message_id: get_uuid(row, "message_id")?,
            old_content: row.get("old_content")?,
            edited_at: get_time(row, "edited_at")?,
            edited_by: get_opt_uuid(row, "edited_by")?,
        })
    }

    /// History of a message, most recent edit first.
    pub fn list_for_message(conn: &Connection, message_id: &Uuid) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM message_history WHERE message_id = ?1
             ORDER BY edited_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([message_id.to_string()], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn insert(&mut self, conn: &Connection) -> PdResult<i64> {
        conn.execute(
            "INSERT INTO message_history (message_id, old_content, edited_at, edited_by)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.message_id.to_string(),
                self.old_content,
                to_sql_time(&self.edited_at),
                self.edited_by.map(|id| id.to_string()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }
}
