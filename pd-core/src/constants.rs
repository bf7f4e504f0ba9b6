//! Application-wide constants.

/// Application name.
pub const APP_NAME: &str = "prodev";

/// Application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rolling log file prefix.
pub const LOG_FILE_NAME: &str = "prodev.log";

/// Default file name of the messaging database.
pub const MESSAGING_DB_FILE: &str = "messaging.db";

/// Default file name of the demo users database.
pub const USERS_DB_FILE: &str = "users.db";

/// Messaging database schema version.
pub const DB_SCHEMA_VERSION: i32 = 1;

/// Default GitHub REST API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// Number of characters shown in a message preview.
pub const MESSAGE_PREVIEW_CHARS: usize = 20;

/// Maximum stored length of a phone number.
pub const MAX_PHONE_LEN: usize = 20;

/// Pagination defaults.
pub mod pagination {
    /// Default page size for list endpoints.
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Upper bound for a client-requested page size.
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// User role names.
pub mod roles {
    pub const GUEST: &str = "guest";
    pub const HOST: &str = "host";
    pub const ADMIN: &str = "admin";
    pub const MODERATOR: &str = "moderator";

    /// All valid roles.
    pub const ALL: &[&str] = &[GUEST, HOST, ADMIN, MODERATOR];
}
