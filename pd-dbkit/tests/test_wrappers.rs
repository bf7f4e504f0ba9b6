//! Wrapper behaviour against on-disk databases.

mod common;

use std::time::Duration;

use common::TestDb;
use pd_core::PdError;
use pd_dbkit::{
    fetch_all, fetch_all_users, get_user_by_id, log_queries, retry_on_failure, update_user_email,
    with_db_connection, ExecuteQuery, QueryCache, RetryPolicy,
};
use serde_json::json;

#[test]
fn test_fetch_users_through_logged_connection() {
    let db = TestDb::new().with_demo_users();

    let rows = with_db_connection(db.users_db(), |conn| {
        log_queries("SELECT * FROM users", |q| fetch_all(conn, q, &[]))
    })
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec![json!(1), json!("Alice"), json!("alice@example.com"), json!(31)]);
}

#[test]
fn test_update_email_is_visible_on_a_new_connection() {
    let db = TestDb::new().with_demo_users();

    with_db_connection(db.users_db(), |conn| {
        update_user_email(conn, 1, "Crawford_Cartwright@hotmail.com")
    })
    .unwrap();

    let alice = with_db_connection(db.users_db(), |conn| get_user_by_id(conn, 1))
        .unwrap()
        .unwrap();
    assert_eq!(alice.email, "Crawford_Cartwright@hotmail.com");
}

#[test]
fn test_retry_recovers_once_the_table_exists() {
    let db = TestDb::new();
    let path = db.users_db();
    let mut attempts = 0;

    let users = retry_on_failure(&RetryPolicy::new(3, Duration::ZERO), || {
        attempts += 1;
        if attempts == 2 {
            with_db_connection(&path, |conn| pd_dbkit::setup_demo_users(conn))?;
        }
        with_db_connection(&path, |conn| fetch_all_users(conn))
    })
    .unwrap();

    assert_eq!(attempts, 2);
    assert_eq!(users.len(), 2);
}

#[test]
fn test_cache_skips_the_database_on_hit() {
    let db = TestDb::new().with_demo_users();
    let cache = QueryCache::new();
    let query = "SELECT * FROM users";

    let first = with_db_connection(db.users_db(), |conn| cache.fetch(conn, query)).unwrap();

    // With the file gone a real query would fail.
    std::fs::remove_file(db.users_db()).unwrap();
    let second = cache.get_or_fetch(query, |_| Err(PdError::Internal("not cached".into()))).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_execute_query_with_age_filter() {
    let db = TestDb::new().with_demo_users();
    let rows = ExecuteQuery::new(db.users_db(), "SELECT name FROM users WHERE age > ?")
        .bind(25)
        .run()
        .unwrap();
    assert_eq!(rows, vec![vec![json!("Alice")], vec![json!("Bob")]]);
}
