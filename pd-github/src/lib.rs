//! prodev GitHub - a small client for GitHub organisations.
//!
//! This crate provides the JSON transport (behind the [`JsonSource`] trait so
//! tests can substitute it), nested JSON map access, per-instance
//! memoisation, and [`GithubOrgClient`] which lists an organisation's public
//! repositories, optionally filtered by license.

pub mod client;
pub mod memo;
pub mod nested;
pub mod org;

// Re-export key types
pub use client::{get_json, HttpJsonSource, JsonSource};
pub use memo::Memo;
pub use nested::access_nested_map;
pub use org::GithubOrgClient;
