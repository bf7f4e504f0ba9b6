//! Query result cache keyed by SQL text.

use std::collections::HashMap;

use parking_lot::RwLock;
use rusqlite::Connection;
use tracing::{debug, info};

use pd_core::error::PdResult;

use crate::rows::Row;
use crate::wrappers::fetch_all;

/// Caches the rows returned for each distinct query string.
///
/// The cache is an ordinary value: share it by reference or wrap it in an
/// `Arc`. Entries never expire; use [`invalidate`](Self::invalidate) or
/// [`clear`](Self::clear) after writes. Two threads missing on the same key
/// at once may both run the query; the later result wins.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, Vec<Row>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached rows for `query`, or run `fetch` and cache them.
    pub fn get_or_fetch<F>(&self, query: &str, fetch: F) -> PdResult<Vec<Row>>
    where
        F: FnOnce(&str) -> PdResult<Vec<Row>>,
    {
        if let Some(rows) = self.entries.read().get(query) {
            info!("cache hit: {query}");
            return Ok(rows.clone());
        }

        info!("cache miss: {query}");
        let rows = fetch(query)?;
        self.entries.write().insert(query.to_string(), rows.clone());
        Ok(rows)
    }

    /// Run `query` on `conn` unless its rows are already cached.
    pub fn fetch(&self, conn: &Connection, query: &str) -> PdResult<Vec<Row>> {
        self.get_or_fetch(query, |q| fetch_all(conn, q, &[]))
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.read().contains_key(query)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, query: &str) -> bool {
        let removed = self.entries.write().remove(query).is_some();
        if removed {
            debug!("cache entry invalidated: {query}");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_second_lookup_is_served_from_cache() {
        let cache = QueryCache::new();
        let calls = Cell::new(0);
        let fetch = |_: &str| {
            calls.set(calls.get() + 1);
            Ok(vec![vec![json!(1)]])
        };

        let first = cache.get_or_fetch("SELECT 1", fetch).unwrap();
        let second = cache.get_or_fetch("SELECT 1", fetch).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_queries_get_distinct_entries() {
        let conn = Connection::open_in_memory().unwrap();
        let cache = QueryCache::new();
        assert_eq!(cache.fetch(&conn, "SELECT 1").unwrap(), vec![vec![json!(1)]]);
        assert_eq!(cache.fetch(&conn, "SELECT 2").unwrap(), vec![vec![json!(2)]]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let conn = Connection::open_in_memory().unwrap();
        let cache = QueryCache::new();
        assert!(cache.fetch(&conn, "SELECT * FROM nowhere").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let conn = Connection::open_in_memory().unwrap();
        let cache = QueryCache::new();
        cache.fetch(&conn, "SELECT 1").unwrap();
        cache.fetch(&conn, "SELECT 2").unwrap();

        assert!(cache.invalidate("SELECT 1"));
        assert!(!cache.invalidate("SELECT 1"));
        assert!(!cache.contains("SELECT 1"));
        assert!(cache.contains("SELECT 2"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
