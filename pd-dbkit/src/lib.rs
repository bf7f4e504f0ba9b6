//! prodev DB kit - helpers around plain SQLite connections.
//!
//! Covers the `users.db` demos (scoped connections, query logging,
//! transactions, retries, a query cache, concurrent reads) and the
//! `user_data` table (CSV seeding, lazy streaming, batching, pagination).
//! Unlike `pd-models`, nothing here is pooled: every helper opens the
//! connection it needs and closes it when done.

pub mod cache;
pub mod concurrent;
pub mod demo;
pub mod retry;
pub mod rows;
pub mod scoped;
pub mod streams;
pub mod user_data;
pub mod wrappers;

// Re-export key types
pub use cache::QueryCache;
pub use concurrent::{fetch_concurrently, ConcurrentUsers};
pub use demo::{
    fetch_all_users, fetch_users, get_user_by_id, setup_demo_users, update_user_email, DemoUser,
    SELECT_ALL_USERS,
};
pub use retry::{retry_on_failure, RetryPolicy};
pub use rows::Row;
pub use scoped::{DatabaseConnection, ExecuteQuery};
pub use streams::{
    average_age, batch_processing, lazy_paginate, paginate_users, stream_user_ages, stream_users,
    stream_users_in_batches, BatchStream, LazyPaginator,
};
pub use user_data::{connect_to_prodev, create_user_data_table, insert_user_data_from_csv, UserData};
pub use wrappers::{fetch_all, log_queries, transactional, with_db_connection};
