//! Connection, logging and transaction wrappers.
//!
//! Each wrapper takes the work as a closure and guarantees its side effect
//! (closing, logging, commit/rollback) on every exit path.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Transaction};
use tracing::{error, info};

use pd_core::error::PdResult;

use crate::rows::{row_to_json, Row};
use crate::scoped::DatabaseConnection;

/// Open the database at `path`, hand the connection to `f`, then close it.
///
/// The connection is closed whether `f` succeeds or fails. A failure is
/// logged and returned unchanged.
pub fn with_db_connection<T, F>(path: impl AsRef<Path>, f: F) -> PdResult<T>
where
    F: FnOnce(&mut Connection) -> PdResult<T>,
{
    let path = path.as_ref();
    let mut conn = DatabaseConnection::open(path)?;
    info!("opened database connection to {}", path.display());

    let result = f(&mut conn);
    if let Err(e) = &result {
        error!("database operation on {} failed: {e}", path.display());
    }

    drop(conn);
    info!("closed database connection to {}", path.display());
    result
}

/// Log `query` and then run it through `f`.
pub fn log_queries<T, F>(query: &str, f: F) -> PdResult<T>
where
    F: FnOnce(&str) -> PdResult<T>,
{
    info!("executing query: {query}");
    f(query)
}

/// Run `query` with positional `params` and collect every row.
pub fn fetch_all(conn: &Connection, query: &str, params: &[SqlValue]) -> PdResult<Vec<Row>> {
    let mut stmt = conn.prepare(query)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), row_to_json)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Run `f` inside a transaction.
///
/// Commits when `f` returns `Ok`. Otherwise rolls back, logs the error and
/// returns it.
pub fn transactional<T, F>(conn: &mut Connection, f: F) -> PdResult<T>
where
    F: FnOnce(&Transaction<'_>) -> PdResult<T>,
{
    let tx = conn.transaction()?;
    match f(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(e) => {
            error!("transaction rolled back: {e}");
            if let Err(rollback_err) = tx.rollback() {
                error!("rollback failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::error::PdError;
    use serde_json::json;
    use tempfile::TempDir;

    fn table(conn: &Connection) {
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT);")
            .unwrap();
    }

    #[test]
    fn test_with_db_connection_passes_result_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("w.db");

        let n = with_db_connection(&path, |conn| {
            table(conn);
            conn.execute("INSERT INTO t (v) VALUES ('a')", [])?;
            Ok(conn.last_insert_rowid())
        })
        .unwrap();
        assert_eq!(n, 1);

        let err = with_db_connection(&path, |conn| fetch_all(conn, "SELECT * FROM missing", &[]));
        assert!(matches!(err, Err(PdError::Database(_))));
    }

    #[test]
    fn test_log_queries_runs_the_query() {
        let conn = Connection::open_in_memory().unwrap();
        let rows = log_queries("SELECT 1 + 1", |q| fetch_all(&conn, q, &[])).unwrap();
        assert_eq!(rows, vec![vec![json!(2)]]);
    }

    #[test]
    fn test_fetch_all_binds_params() {
        let conn = Connection::open_in_memory().unwrap();
        table(&conn);
        conn.execute_batch("INSERT INTO t (v) VALUES ('a'), ('b'), ('c');")
            .unwrap();

        let rows = fetch_all(&conn, "SELECT v FROM t WHERE id >= ?", &[SqlValue::Integer(2)]).unwrap();
        assert_eq!(rows, vec![vec![json!("b")], vec![json!("c")]]);
    }

    #[test]
    fn test_transactional_commits_and_rolls_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        table(&conn);

        transactional(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES ('kept')", [])?;
            Ok(())
        })
        .unwrap();

        let failed: PdResult<()> = transactional(&mut conn, |tx| {
            tx.execute("INSERT INTO t (v) VALUES ('dropped')", [])?;
            Err(PdError::Validation("nope".into()))
        });
        assert!(matches!(failed, Err(PdError::Validation(_))));

        let rows = fetch_all(&conn, "SELECT v FROM t", &[]).unwrap();
        assert_eq!(rows, vec![vec![json!("kept")]]);
    }
}
