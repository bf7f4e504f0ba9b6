//! Scoped connections and one-shot query execution.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

use pd_core::error::{PdError, PdResult};

use crate::rows::{row_to_json, Row};

/// A SQLite connection that is closed when the guard goes out of scope.
///
/// Dereferences to [`Connection`]. The close happens on every exit path,
/// including early returns and unwinding.
pub struct DatabaseConnection {
    conn: Connection,
    path: PathBuf,
}

impl DatabaseConnection {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> PdResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|e| PdError::Database(format!("failed to open {}: {e}", path.display())))?;
        debug!("connection opened to {}", path.display());
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for DatabaseConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

impl Drop for DatabaseConnection {
    fn drop(&mut self) {
        // The inner connection closes right after this runs.
        debug!("connection closed to {}", self.path.display());
    }
}

/// Open a connection, run one parameterised query, return its rows, close.
///
/// ```no_run
/// # use pd_dbkit::ExecuteQuery;
/// let rows = ExecuteQuery::new("users.db", "SELECT * FROM users WHERE age > ?")
///     .bind(25)
///     .run()?;
/// # Ok::<(), pd_core::PdError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExecuteQuery {
    path: PathBuf,
    query: String,
    params: Vec<SqlValue>,
}

impl ExecuteQuery {
    pub fn new(path: impl AsRef<Path>, query: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            query: query.to_string(),
            params: Vec::new(),
        }
    }

    /// Append a positional parameter.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Execute and collect every row. The connection is closed on return,
    /// including when the query fails.
    pub fn run(self) -> PdResult<Vec<Row>> {
        let conn = DatabaseConnection::open(&self.path)?;
        let mut stmt = conn.prepare(&self.query)?;
        let rows = stmt
            .query_map(params_from_iter(self.params.iter()), row_to_json)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
