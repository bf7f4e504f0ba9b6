//! The demo `users` table.

use rusqlite::{params, Connection};
use serde::Serialize;
use tracing::info;

use pd_core::error::{PdError, PdResult};

use crate::wrappers::transactional;

const CREATE_USERS_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    age   INTEGER
);
";

const SEED_USERS: [(&str, &str, i64); 2] = [
    ("Alice", "alice@example.com", 31),
    ("Bob", "bob@example.com", 45),
];

/// A row of the demo `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
}

impl DemoUser {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
        })
    }
}

/// Create the `users` table and seed the two demo users.
///
/// Safe to call repeatedly. Returns how many users were newly inserted.
pub fn setup_demo_users(conn: &Connection) -> PdResult<usize> {
    conn.execute_batch(CREATE_USERS_SQL)?;
    let mut inserted = 0;
    for (name, email, age) in SEED_USERS {
        inserted += conn.execute(
            "INSERT OR IGNORE INTO users (name, email, age) VALUES (?1, ?2, ?3)",
            params![name, email, age],
        )?;
    }
    info!("demo users ready ({inserted} inserted)");
    Ok(inserted)
}

/// Select statement behind [`fetch_all_users`].
pub const SELECT_ALL_USERS: &str = "SELECT id, name, email, age FROM users ORDER BY id";

/// All demo users ordered by id.
pub fn fetch_all_users(conn: &Connection) -> PdResult<Vec<DemoUser>> {
    fetch_users(conn, SELECT_ALL_USERS)
}

/// Run `query` and map each row to a [`DemoUser`].
///
/// The query must select `id, name, email, age`.
pub fn fetch_users(conn: &Connection, query: &str) -> PdResult<Vec<DemoUser>> {
    let mut stmt = conn.prepare(query)?;
    let users = stmt
        .query_map([], DemoUser::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(users)
}

/// Look up one demo user.
pub fn get_user_by_id(conn: &Connection, id: i64) -> PdResult<Option<DemoUser>> {
    let result = conn.query_row(
        "SELECT id, name, email, age FROM users WHERE id = ?1",
        params![id],
        DemoUser::from_row,
    );
    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Change a user's email inside a transaction.
///
/// Fails with `NotFound` (and changes nothing) when no user has `id`.
pub fn update_user_email(conn: &mut Connection, id: i64, email: &str) -> PdResult<()> {
    transactional(conn, |tx| {
        let changed = tx.execute(
            "UPDATE users SET email = ?1 WHERE id = ?2",
            params![email, id],
        )?;
        if changed == 0 {
            return Err(PdError::not_found("user", id));
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_demo_users(&conn).unwrap();
        conn
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = seeded();
        assert_eq!(setup_demo_users(&conn).unwrap(), 0);

        let users = fetch_all_users(&conn).unwrap();
        let names: Vec<_> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);
        assert_eq!(users[0].email, "alice@example.com");
    }

    #[test]
    fn test_fetch_users_runs_given_query() {
        let conn = seeded();

        let all = fetch_users(&conn, SELECT_ALL_USERS).unwrap();
        assert_eq!(all.len(), fetch_all_users(&conn).unwrap().len());

        let older = fetch_users(&conn, "SELECT id, name, email, age FROM users WHERE age > 40").unwrap();
        assert!(older.iter().all(|u| u.age.is_some_and(|age| age > 40)));
        assert!(older.len() < all.len());
    }

    #[test]
    fn test_get_user_by_id() {
        let conn = seeded();
        let bob = get_user_by_id(&conn, 2).unwrap().unwrap();
        assert_eq!(bob.name, "Bob");
        assert_eq!(bob.age, Some(45));
        assert!(get_user_by_id(&conn, 99).unwrap().is_none());
    }

    #[test]
    fn test_update_user_email() {
        let mut conn = seeded();
        update_user_email(&mut conn, 1, "Crawford_Cartwright@hotmail.com").unwrap();
        let alice = get_user_by_id(&conn, 1).unwrap().unwrap();
        assert_eq!(alice.email, "Crawford_Cartwright@hotmail.com");

        let missing = update_user_email(&mut conn, 42, "x@example.com");
        assert!(matches!(missing, Err(PdError::NotFound { resource: "user", .. })));
    }

    #[test]
    fn test_update_to_taken_email_rolls_back() {
        let mut conn = seeded();
        assert!(update_user_email(&mut conn, 1, "bob@example.com").is_err());
        let alice = get_user_by_id(&conn, 1).unwrap().unwrap();
        assert_eq!(alice.email, "alice@example.com");
    }
}
