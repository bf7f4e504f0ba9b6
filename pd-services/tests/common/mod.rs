//! Shared test utilities for integration tests.

#![allow(dead_code)]

use pd_core::config::{AppConfig, DatabaseConfig};
use pd_models::{Database, User};
use pd_services::{NewUser, Services};
use tempfile::TempDir;

/// Create a temporary database with full schema and migrations applied.
/// Returns the Database and the TempDir (must be held alive for the duration of the test).
pub fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("messaging.db");
    let db = Database::init(&path, &DatabaseConfig::default()).expect("failed to init test database");
    (db, dir)
}

/// A config with a fixed signing secret.
pub fn create_test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".into();
    config
}

pub fn create_test_services() -> (Services, TempDir) {
    let (db, dir) = create_test_db();
    (Services::new(db, &create_test_config()), dir)
}

/// Register a guest with password `password`.
pub fn register(services: &Services, username: &str) -> User {
    services
        .users
        .register(NewUser::new(username, &format!("{username}@example.com"), "password"))
        .expect("failed to register user")
}
