//! prodev Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other prodev crates:
//! - Application configuration (server, database, auth, middleware, demos)
//! - Global error type covering all error categories
//! - Structured logging with tracing
//! - Data and config directory lookup
//! - Common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{PdError, PdResult};
pub use logging::init_logging;
