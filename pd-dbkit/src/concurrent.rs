//! Running independent queries at the same time.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::task::{spawn_blocking, JoinError};
use tracing::debug;

use pd_core::error::{PdError, PdResult};

use crate::rows::Row;
use crate::scoped::ExecuteQuery;

pub const ALL_USERS_QUERY: &str = "SELECT * FROM users";
pub const OLDER_USERS_QUERY: &str = "SELECT * FROM users WHERE age > ?";

/// Results of [`fetch_concurrently`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConcurrentUsers {
    pub all_users: Vec<Row>,
    pub older_users: Vec<Row>,
}

/// Fetch all users and the users older than `older_than` concurrently.
///
/// Each query runs on its own connection on the blocking pool. Returns once
/// both have finished; the first error wins.
pub async fn fetch_concurrently(path: impl AsRef<Path>, older_than: i64) -> PdResult<ConcurrentUsers> {
    let path: PathBuf = path.as_ref().to_path_buf();
    debug!("fetching users concurrently from {}", path.display());

    let all_path = path.clone();
    let all = spawn_blocking(move || ExecuteQuery::new(&all_path, ALL_USERS_QUERY).run());
    let older = spawn_blocking(move || {
        ExecuteQuery::new(&path, OLDER_USERS_QUERY)
            .bind(older_than)
            .run()
    });

    let (all, older) = tokio::join!(all, older);
    Ok(ConcurrentUsers {
        all_users: joined(all)?,
        older_users: joined(older)?,
    })
}

fn joined<T>(result: Result<PdResult<T>, JoinError>) -> PdResult<T> {
    result.map_err(|e| PdError::Internal(format!("query task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::setup_demo_users;
    use crate::scoped::DatabaseConnection;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_concurrently() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.db");
        setup_demo_users(&DatabaseConnection::open(&path).unwrap()).unwrap();

        let result = fetch_concurrently(&path, 40).await.unwrap();
        assert_eq!(result.all_users.len(), 2);
        assert_eq!(result.older_users.len(), 1);
        assert_eq!(result.older_users[0][1], json!("Bob"));
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = fetch_concurrently(dir.path().join("empty.db"), 40).await;
        assert!(matches!(result, Err(PdError::Database(_))));
    }
}
