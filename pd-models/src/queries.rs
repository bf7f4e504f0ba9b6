//! Query helpers for common messaging access patterns.
//!
//! Provides the filtered, paginated message listing, thread traversal and
//! batch loading of message senders. All queries use parameterized SQL.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use uuid::Uuid;

use pd_core::error::PdResult;

use crate::models::message::Message;
use crate::models::to_sql_time;
use crate::models::user::User;

// ─── Message Listing ────────────────────────────────────────────────────────

/// Filters for the message list. Every set field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Only conversations this user participates in.
    pub participant: Option<Uuid>,
    /// Only this conversation.
    pub conversation: Option<Uuid>,
    /// Sent at or after this instant.
    pub sent_after: Option<DateTime<Utc>>,
    /// Sent at or before this instant.
    pub sent_before: Option<DateTime<Utc>>,
}

impl MessageFilter {
    /// Build the WHERE clause for messages visible to `viewer`.
    fn where_clause(&self, viewer: &Uuid) -> (String, Vec<Value>) {
        let mut clauses = vec![
            "m.conversation_id IN (SELECT conversation_id FROM conversation_participants WHERE user_id = ?)"
                .to_string(),
        ];
        let mut values = vec![Value::Text(viewer.to_string())];

        if let Some(participant) = &self.participant {
            clauses.push(
                "m.conversation_id IN (SELECT conversation_id FROM conversation_participants WHERE user_id = ?)"
                    .to_string(),
            );
            values.push(Value::Text(participant.to_string()));
        }
        if let Some(conversation) = &self.conversation {
            clauses.push("m.conversation_id = ?".to_string());
            values.push(Value::Text(conversation.to_string()));
        }
        if let Some(after) = &self.sent_after {
            clauses.push("m.sent_at >= ?".to_string());
            values.push(Value::Text(to_sql_time(after)));
        }
        if let Some(before) = &self.sent_before {
            clauses.push("m.sent_at <= ?".to_string());
            values.push(Value::Text(to_sql_time(before)));
        }

        (clauses.join(" AND "), values)
    }
}

/// Messages visible to `viewer` matching the filter, newest first.
pub fn list_messages_for_user(
    conn: &Connection,
    viewer: &Uuid,
    filter: &MessageFilter,
    limit: i64,
    offset: i64,
) -> PdResult<Vec<Message>> {
    let (where_sql, mut values) = filter.where_clause(viewer);
    let sql = format!(
        "SELECT m.* FROM messages m WHERE {where_sql}
         ORDER BY m.sent_at DESC, m.message_id
         LIMIT ? OFFSET ?"
    );
    values.push(Value::Integer(limit));
    values.push(Value::Integer(offset));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), Message::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Number of messages [`list_messages_for_user`] would page through.
pub fn count_messages_for_user(conn: &Connection, viewer: &Uuid, filter: &MessageFilter) -> PdResult<i64> {
    let (where_sql, values) = filter.where_clause(viewer);
    let sql = format!("SELECT COUNT(*) FROM messages m WHERE {where_sql}");
    let count = conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?;
    Ok(count)
}

// ─── Threads ────────────────────────────────────────────────────────────────

/// A reply in a flattened thread.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadEntry {
    /// 1 for direct replies to the root, 2 for their replies, and so on.
    pub depth: usize,
    pub message: Message,
}

/// All replies below `root_id`, depth-first, siblings ordered by `sent_at`.
///
/// The root itself is not included. Each message is visited once even if
/// the stored parent links form a cycle.
pub fn thread(conn: &Connection, root_id: &Uuid) -> PdResult<Vec<ThreadEntry>> {
    let mut visited: HashSet<Uuid> = HashSet::new();
    visited.insert(*root_id);

    let mut out = Vec::new();
    let mut stack: Vec<(usize, Message)> = Message::replies(conn, root_id)?
        .into_iter()
        .rev()
        .map(|m| (1, m))
        .collect();

    while let Some((depth, message)) = stack.pop() {
        if !visited.insert(message.message_id) {
            continue;
        }
        let children = Message::replies(conn, &message.message_id)?;
        stack.extend(children.into_iter().rev().map(|m| (depth + 1, m)));
        out.push(ThreadEntry { depth, message });
    }

    Ok(out)
}

// ─── Batch Loading ──────────────────────────────────────────────────────────

/// Load the senders of `messages` in one query, keyed by user id.
pub fn load_senders(conn: &Connection, messages: &[Message]) -> PdResult<HashMap<Uuid, User>> {
    let ids: HashSet<String> = messages.iter().map(|m| m.sender_id.to_string()).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!("SELECT * FROM users WHERE user_id IN ({placeholders})");
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(params_from_iter(ids.iter()), User::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(users.into_iter().map(|u| (u.user_id, u)).collect())
}
