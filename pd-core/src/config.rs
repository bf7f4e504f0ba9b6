//! Application configuration management.
//!
//! Handles loading, saving, and accessing application configuration for the
//! REST server, the messaging database, authentication, the middleware
//! pipeline and the standalone demos. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::{pagination, roles, GITHUB_API_BASE, MESSAGING_DB_FILE, USERS_DB_FILE};
use crate::error::{PdError, PdResult};
use crate::paths;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Messaging database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Token signing and lifetimes.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Request pipeline settings.
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// List endpoint paging.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// GitHub client settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Settings for the `users.db` and `user_data` demos.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. A random secret is generated at
    /// startup when empty, which invalidates tokens across restarts.
    #[serde(default)]
    pub jwt_secret: String,

    /// Access token lifetime in minutes.
    #[serde(default = "default_access_minutes")]
    pub access_token_minutes: i64,

    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_days")]
    pub refresh_token_days: i64,
}

/// Middleware pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Reject requests outside the access window.
    #[serde(default = "default_true")]
    pub enforce_access_window: bool,

    /// Window start, `HH:MM` local time.
    #[serde(default = "default_window_start")]
    pub access_window_start: String,

    /// Window end, `HH:MM` local time, inclusive.
    #[serde(default = "default_window_end")]
    pub access_window_end: String,

    /// Requests allowed per client IP within the rate window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,

    /// Sliding rate window in seconds.
    #[serde(default = "default_rate_window")]
    pub rate_window_secs: u64,

    /// Path fragment of throttled POST requests.
    #[serde(default = "default_throttled_fragment")]
    pub throttled_path_fragment: String,

    /// Path fragment of role-restricted requests.
    #[serde(default = "default_restricted_fragment")]
    pub restricted_path_fragment: String,

    /// Roles allowed through the restricted paths.
    #[serde(default = "default_allowed_roles")]
    pub allowed_roles: Vec<String>,
}

/// Pagination configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the client does not ask for one.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound for `page_size`.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

/// GitHub client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL.
    #[serde(default = "default_github_base")]
    pub api_base: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_github_timeout")]
    pub timeout_ms: u64,
}

/// Demo database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Path to the demo `users` database.
    #[serde(default = "default_users_db")]
    pub users_db: String,

    /// Path to the `user_data` database. If empty, uses the users database.
    #[serde(default)]
    pub user_data_db: String,

    /// Attempts made by the retry demo.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Fixed delay between retry attempts in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Age threshold of the concurrent query demo.
    #[serde(default = "default_older_than")]
    pub older_than: i64,
}

// Default value functions for serde

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_access_minutes() -> i64 {
    15
}

fn default_refresh_days() -> i64 {
    7
}

fn default_window_start() -> String {
    "06:00".to_string()
}

fn default_window_end() -> String {
    "21:00".to_string()
}

fn default_rate_limit() -> usize {
    5
}

fn default_rate_window() -> u64 {
    60
}

fn default_throttled_fragment() -> String {
    "/messages".to_string()
}

fn default_restricted_fragment() -> String {
    "/admin-action".to_string()
}

fn default_allowed_roles() -> Vec<String> {
    vec![roles::ADMIN.to_string(), roles::MODERATOR.to_string()]
}

fn default_page_size() -> u32 {
    pagination::DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    pagination::MAX_PAGE_SIZE
}

fn default_github_base() -> String {
    GITHUB_API_BASE.to_string()
}

fn default_user_agent() -> String {
    format!("prodev/{}", crate::constants::APP_VERSION)
}

fn default_github_timeout() -> u64 {
    10_000
}

fn default_users_db() -> String {
    USERS_DB_FILE.to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1_000
}

fn default_older_than() -> i64 {
    40
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            middleware: MiddlewareConfig::default(),
            pagination: PaginationConfig::default(),
            github: GithubConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_minutes: default_access_minutes(),
            refresh_token_days: default_refresh_days(),
        }
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            enforce_access_window: true,
            access_window_start: default_window_start(),
            access_window_end: default_window_end(),
            rate_limit: default_rate_limit(),
            rate_window_secs: default_rate_window(),
            throttled_path_fragment: default_throttled_fragment(),
            restricted_path_fragment: default_restricted_fragment(),
            allowed_roles: default_allowed_roles(),
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_base(),
            user_agent: default_user_agent(),
            timeout_ms: default_github_timeout(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            users_db: default_users_db(),
            user_data_db: String::new(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            older_than: default_older_than(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> PdResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> PdResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to the default config file path.
    pub fn save_default(&self) -> PdResult<()> {
        let path = Self::default_config_path()?;
        self.save_to_file(&path)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> PdResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PdError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PdResult<PathBuf> {
        let config_dir = paths::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective messaging database path.
    pub fn effective_db_path(&self) -> PdResult<PathBuf> {
        if self.database.path.is_empty() {
            let data_dir = paths::data_dir()?;
            Ok(data_dir.join(MESSAGING_DB_FILE))
        } else {
            Ok(PathBuf::from(&self.database.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> PdResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = paths::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Get the database file holding the `user_data` table.
    pub fn effective_user_data_db(&self) -> PathBuf {
        if self.demo.user_data_db.is_empty() {
            PathBuf::from(&self.demo.users_db)
        } else {
            PathBuf::from(&self.demo.user_data_db)
        }
    }

    /// Check the values serde cannot validate on its own.
    pub fn validate(&self) -> PdResult<()> {
        if self.pagination.page_size == 0 {
            return Err(PdError::Config("pagination.page_size must be positive".into()));
        }
        if self.pagination.page_size > self.pagination.max_page_size {
            return Err(PdError::Config(
                "pagination.page_size exceeds pagination.max_page_size".into(),
            ));
        }
        if self.middleware.rate_limit == 0 {
            return Err(PdError::Config("middleware.rate_limit must be positive".into()));
        }
        if self.auth.access_token_minutes <= 0 || self.auth.refresh_token_days <= 0 {
            return Err(PdError::Config("token lifetimes must be positive".into()));
        }
        for role in &self.middleware.allowed_roles {
            if !roles::ALL.contains(&role.as_str()) {
                return Err(PdError::Config(format!("unknown role in allowed_roles: {role}")));
            }
        }
        Ok(())
    }
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }

    /// Save the current configuration to disk.
    pub async fn save(&self) -> PdResult<()> {
        let config = self.inner.read().await;
        config.save_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert!(config.database.wal_mode);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auth.access_token_minutes, 15);
        assert_eq!(config.auth.refresh_token_days, 7);
        assert_eq!(config.middleware.rate_limit, 5);
        assert_eq!(config.middleware.rate_window_secs, 60);
        assert_eq!(config.pagination.page_size, 20);
        assert_eq!(config.pagination.max_page_size, 100);
        assert_eq!(config.demo.retries, 3);
        assert_eq!(config.demo.retry_delay_ms, 1_000);
        assert_eq!(config.demo.older_than, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [middleware]
            enforce_access_window = false

            [demo]
            retries = 5
            "#,
        )
        .unwrap();
        assert!(!config.middleware.enforce_access_window);
        assert_eq!(config.middleware.access_window_start, "06:00");
        assert_eq!(config.demo.retries, 5);
        assert_eq!(config.demo.older_than, 40);
        assert_eq!(config.github.api_base, "https://api.github.com");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.pagination.page_size = 500;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.middleware.allowed_roles = vec!["root".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_user_data_db_falls_back_to_users_db() {
        let mut config = AppConfig::default();
        assert_eq!(config.effective_user_data_db(), PathBuf::from("users.db"));
        config.demo.user_data_db = "prodev.db".into();
        assert_eq!(config.effective_user_data_db(), PathBuf::from("prodev.db"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.server.bind = "0.0.0.0:9000".into();
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:9000");
    }

    #[tokio::test]
    async fn test_config_handle_write_is_visible() {
        let handle = ConfigHandle::new(AppConfig::default());
        handle.write().await.demo.older_than = 30;
        assert_eq!(handle.read().await.demo.older_than, 30);
        assert_eq!(handle.snapshot().await.demo.older_than, 30);
    }
}
