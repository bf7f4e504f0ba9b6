//! Global error types for prodev.
//!
//! All error categories across the workspace are unified into a single
//! `PdError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using PdError.
pub type PdResult<T> = Result<T, PdError>;

/// Unified error type covering all error categories in prodev.
#[derive(Error, Debug)]
pub enum PdError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Database errors --
    /// SQLite database error.
    #[error("database error: {0}")]
    Database(String),

    /// Database migration failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    // -- Network errors --
    /// HTTP request failed before a response was received.
    #[error("http error: {0}")]
    Http(String),

    /// The server answered with a non-success status.
    #[error("http status {status} from {url}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// HTTP request timed out.
    #[error("request timeout: {0}")]
    Timeout(String),

    // -- Lookup errors --
    /// A key was missing while walking a nested mapping.
    #[error("key not found: {0:?}")]
    KeyNotFound(String),

    /// A stored entity does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "message".
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    // -- Request errors --
    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Authentication failed or credentials are missing.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PdError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        PdError::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for PdError {
    fn from(e: serde_json::Error) -> Self {
        PdError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for PdError {
    fn from(e: toml::de::Error) -> Self {
        PdError::Config(e.to_string())
    }
}

impl From<rusqlite::Error> for PdError {
    fn from(e: rusqlite::Error) -> Self {
        PdError::Database(e.to_string())
    }
}

impl From<csv::Error> for PdError {
    fn from(e: csv::Error) -> Self {
        PdError::Serialization(format!("csv: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pd_error_display() {
        let err = PdError::Config("bad value".to_string());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_key_not_found_names_key() {
        let err = PdError::KeyNotFound("b".into());
        assert_eq!(err.to_string(), "key not found: \"b\"");
    }

    #[test]
    fn test_not_found_helper() {
        let err = PdError::not_found("message", 42);
        assert_eq!(err.to_string(), "message not found: 42");
    }

    #[test]
    fn test_from_rusqlite() {
        let err: PdError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, PdError::Database(_)));
    }
}
