//! The `user_data` table and its CSV seed.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use pd_core::error::PdResult;

use crate::scoped::DatabaseConnection;

const CREATE_USER_DATA_SQL: &str = "
CREATE TABLE IF NOT EXISTS user_data (
    user_id TEXT PRIMARY KEY,
    name    TEXT NOT NULL,
    email   TEXT NOT NULL,
    age     INTEGER NOT NULL
);
";

/// One row of `user_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub age: i64,
}

impl UserData {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            age: row.get("age")?,
        })
    }
}

/// A CSV line before validation. Every column may be absent or blank.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    age: Option<String>,
}

impl CsvRecord {
    /// `None` when a required column is blank or the age is not a number.
    fn into_user_data(self, line: usize) -> Option<UserData> {
        let present = |v: Option<String>| v.filter(|s| !s.is_empty());
        let (Some(name), Some(email), Some(age)) =
            (present(self.name), present(self.email), present(self.age))
        else {
            debug!("skipping CSV line {line}: missing name, email or age");
            return None;
        };

        let age = match age.parse::<f64>() {
            Ok(a) if a.is_finite() => a.round() as i64,
            _ => {
                warn!("skipping CSV line {line}: invalid age {age:?}");
                return None;
            }
        };

        let user_id = present(self.user_id).unwrap_or_else(|| Uuid::new_v4().to_string());
        Some(UserData {
            user_id,
            name,
            email,
            age,
        })
    }
}

/// Open (creating if needed) the database holding `user_data`.
pub fn connect_to_prodev(path: impl AsRef<Path>) -> PdResult<DatabaseConnection> {
    DatabaseConnection::open(path)
}

pub fn create_user_data_table(conn: &Connection) -> PdResult<()> {
    conn.execute_batch(CREATE_USER_DATA_SQL)?;
    debug!("user_data table ready");
    Ok(())
}

/// Load rows from a CSV file with `user_id,name,email,age` headers.
///
/// `user_id` may be missing, in which case a fresh UUID is used. Lines with
/// a blank name, email or age are skipped, and so are ids already present.
/// Returns the number of rows submitted for insertion.
pub fn insert_user_data_from_csv(conn: &mut Connection, csv_path: &Path) -> PdResult<usize> {
    let file = File::open(csv_path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let tx = conn.transaction()?;
    let mut submitted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO user_data (user_id, name, email, age) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (idx, record) in reader.deserialize::<CsvRecord>().enumerate() {
            // Header is line 1.
            let line = idx + 2;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    warn!("skipping malformed CSV line {line}: {e}");
                    continue;
                }
            };
            let Some(user) = record.into_user_data(line) else {
                continue;
            };
            stmt.execute(params![user.user_id, user.name, user.email, user.age])?;
            submitted += 1;
        }
    }
    tx.commit()?;

    info!("submitted {submitted} rows from {}", csv_path.display());
    Ok(submitted)
}
