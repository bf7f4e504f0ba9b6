//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite in WAL mode with r2d2 connection pooling.
//! Foreign keys are enforced on every pooled connection so that deleting a
//! user cascades through messages, notifications and memberships.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn, error};

use pd_core::error::{PdError, PdResult};
use pd_core::config::DatabaseConfig;

use crate::schema;
use crate::migrations;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Initialize the database at the given path with the provided configuration.
    ///
    /// This:
    /// 1. Creates the database file and parent directories if needed
    /// 2. Sets up connection pooling with per-connection PRAGMAs
    /// 3. Runs integrity checks if configured
    /// 4. Creates the schema tables
    /// 5. Runs pending migrations
    pub fn init(db_path: &Path, config: &DatabaseConfig) -> PdResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("initializing database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| PdError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
            migrations::run_migrations(&conn)?;
        }

        info!("database initialized successfully");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> PdResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| PdError::Pool(e.to_string()))
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> PdResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| PdError::Database(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(PdError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Execute a function within a database transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back when it
    /// returns an error (the transaction is dropped uncommitted).
    pub fn transaction<T, F>(&self, f: F) -> PdResult<T>
    where
        F: FnOnce(&Connection) -> PdResult<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| PdError::Database(e.to_string()))?;

        let result = f(&tx)?;

        tx.commit()
            .map_err(|e| PdError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get database statistics (row counts per table).
    pub fn stats(&self) -> PdResult<DatabaseStats> {
        let conn = self.conn()?;

        let count = |table: &str| -> PdResult<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            conn.query_row(&sql, [], |row| row.get(0))
                .map_err(|e| PdError::Database(e.to_string()))
        };

        Ok(DatabaseStats {
            users: count("users")?,
            conversations: count("conversations")?,
            messages: count("messages")?,
            notifications: count("notifications")?,
            message_history: count("message_history")?,
        })
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> PdResult<()> {
        warn!("resetting database - all data will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)?;
        info!("database reset complete");
        Ok(())
    }
}

/// Database row count statistics.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub users: i64,
    pub conversations: i64,
    pub messages: i64,
    pub notifications: i64,
    pub message_history: i64,
}

impl std::fmt::Display for DatabaseStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "users={}, conversations={}, messages={}, notifications={}, message_history={}",
            self.users, self.conversations, self.messages, self.notifications,
            self.message_history
        )
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;
             PRAGMA foreign_keys=ON;",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let config = DatabaseConfig::default();
        let db = Database::init(&path, &config).unwrap();
        (db, dir)
    }

    #[test]
    fn test_database_init() {
        let (db, _dir) = test_db();
        let stats = db.stats().unwrap();
        assert_eq!(stats.users, 0);
        assert_eq!(stats.messages, 0);
    }

    #[test]
    fn test_integrity_check() {
        let (db, _dir) = test_db();
        assert!(db.run_integrity_check().is_ok());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let (db, _dir) = test_db();
        let conn = db.conn().unwrap();
        let on: i64 = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0)).unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn test_transaction_commits() {
        let (db, _dir) = test_db();
        let result = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO conversations (conversation_id, created_at) VALUES (?1, ?2)",
                rusqlite::params!["c-1", "2024-01-01T00:00:00.000000Z"],
            )?;
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(db.stats().unwrap().conversations, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let (db, _dir) = test_db();
        let result: PdResult<()> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO conversations (conversation_id, created_at) VALUES (?1, ?2)",
                rusqlite::params!["c-1", "2024-01-01T00:00:00.000000Z"],
            )?;
            Err(PdError::Validation("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(db.stats().unwrap().conversations, 0);
    }

    #[test]
    fn test_reset_clears_rows() {
        let (db, _dir) = test_db();
        db.conn()
            .unwrap()
            .execute(
                "INSERT INTO conversations (conversation_id, created_at) VALUES ('c', 'x')",
                [],
            )
            .unwrap();
        db.reset().unwrap();
        assert_eq!(db.stats().unwrap().conversations, 0);
    }
}
