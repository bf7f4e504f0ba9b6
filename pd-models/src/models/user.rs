//! User entity model.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pd_core::constants::roles;
use pd_core::error::{PdError, PdResult};

use super::{get_time, get_uuid, to_sql_time};

/// Account role. Admins and moderators pass the role gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Host,
    Admin,
    Moderator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => roles::GUEST,
            Role::Host => roles::HOST,
            Role::Admin => roles::ADMIN,
            Role::Moderator => roles::MODERATOR,
        }
    }
}

impl FromStr for Role {
    type Err = PdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            roles::GUEST => Ok(Role::Guest),
            roles::HOST => Ok(Role::Host),
            roles::ADMIN => Ok(Role::Admin),
            roles::MODERATOR => Ok(Role::Moderator),
            other => Err(PdError::Validation(format!("unknown role: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account of the messaging service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role: Role,

    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unsaved user with a fresh id.
    pub fn new(username: &str, email: &str, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            phone_number: None,
            role: Role::Guest,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Construct a User from a database row.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let role: String = row.get("role")?;
        Ok(Self {
            user_id: get_uuid(row, "user_id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            phone_number: row.get("phone_number")?,
            role: Role::from_str(&role).unwrap_or_default(),
            password_hash: row.get("password_hash")?,
            created_at: get_time(row, "created_at")?,
        })
    }

    // ─── Static finders ──────────────────────────────────────────────────

    /// Find a user by id.
    pub fn find_by_id(conn: &Connection, user_id: &Uuid) -> PdResult<Option<Self>> {
        match conn.query_row(
            "SELECT * FROM users WHERE user_id = ?1",
            [user_id.to_string()],
            Self::from_row,
        ) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PdError::Database(e.to_string())),
        }
    }

    /// Find a user by username.
    pub fn find_by_username(conn: &Connection, username: &str) -> PdResult<Option<Self>> {
        match conn.query_row(
            "SELECT * FROM users WHERE username = ?1",
            [username],
            Self::from_row,
        ) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(PdError::Database(e.to_string())),
        }
    }

    /// List all users ordered by username.
    pub fn list(conn: &Connection) -> PdResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM users ORDER BY username")?;
        let users = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Whether a user with this id exists.
    pub fn exists(conn: &Connection, user_id: &Uuid) -> PdResult<bool> {
        let found: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    /// Delete a user. Cascades to memberships, messages and notifications.
    pub fn delete(conn: &Connection, user_id: &Uuid) -> PdResult<bool> {
        let changed = conn.execute("DELETE FROM users WHERE user_id = ?1", [user_id.to_string()])?;
        Ok(changed > 0)
    }

    // ─── Computed properties ─────────────────────────────────────────────

    /// Full name, falling back to the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }

    /// Whether this user passes the given role list.
    pub fn has_any_role(&self, allowed: &[String]) -> bool {
        allowed.iter().any(|r| r.eq_ignore_ascii_case(self.role.as_str()))
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Insert this user. Fails on a duplicate username.
    pub fn insert(&self, conn: &Connection) -> PdResult<()> {
        conn.execute(
            "INSERT INTO users (
                user_id, username, email, first_name, last_name,
                phone_number, role, password_hash, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)",
            params![
                self.user_id.to_string(),
                self.username,
                self.email,
                self.first_name,
                self.last_name,
                self.phone_number,
                self.role.as_str(),
                self.password_hash,
                to_sql_time(&self.created_at),
            ],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("users.username") => {
                PdError::Validation(format!("username already taken: {}", self.username))
            }
            other => PdError::Database(other.to_string()),
        })?;
        Ok(())
    }
}
