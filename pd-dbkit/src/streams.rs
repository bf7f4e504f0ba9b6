//! Lazy reads over `user_data`.
//!
//! Nothing here loads the whole table. Single-row streams page through the
//! table internally; batch and page iterators expose the pages directly.
//! Everything is ordered by `rowid`, i.e. insertion order.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::debug;

use pd_core::error::PdResult;

use crate::user_data::{connect_to_prodev, UserData};

/// Rows fetched per round trip by the single-row streams.
const STREAM_CHUNK: i64 = 100;

/// Age above which [`batch_processing`] keeps a user.
pub const BATCH_MIN_AGE: i64 = 25;

const PAGE_SQL: &str =
    "SELECT user_id, name, email, age FROM user_data ORDER BY rowid LIMIT ?1 OFFSET ?2";
const AGES_SQL: &str = "SELECT age FROM user_data ORDER BY rowid LIMIT ?1 OFFSET ?2";

/// Yields rows one at a time, fetching `STREAM_CHUNK` at once.
struct Chunked<'c, T> {
    conn: &'c Connection,
    sql: &'static str,
    map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    buffer: VecDeque<T>,
    offset: i64,
    exhausted: bool,
}

impl<'c, T> Chunked<'c, T> {
    fn new(
        conn: &'c Connection,
        sql: &'static str,
        map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Self {
        Self {
            conn,
            sql,
            map,
            buffer: VecDeque::new(),
            offset: 0,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> PdResult<()> {
        let mut stmt = self.conn.prepare_cached(self.sql)?;
        let chunk = stmt
            .query_map(params![STREAM_CHUNK, self.offset], self.map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if (chunk.len() as i64) < STREAM_CHUNK {
            self.exhausted = true;
        }
        self.offset += chunk.len() as i64;
        self.buffer.extend(chunk);
        Ok(())
    }
}

impl<T> Iterator for Chunked<'_, T> {
    type Item = PdResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

/// Every row of `user_data`, one at a time.
pub fn stream_users(conn: &Connection) -> impl Iterator<Item = PdResult<UserData>> + '_ {
    Chunked::new(conn, PAGE_SQL, UserData::from_row)
}

/// Every age in `user_data`, one at a time.
pub fn stream_user_ages(conn: &Connection) -> impl Iterator<Item = PdResult<i64>> + '_ {
    Chunked::new(conn, AGES_SQL, |row| row.get::<_, i64>(0))
}

/// Average age over `user_data`, or 0 when the table is empty.
pub fn average_age(conn: &Connection) -> PdResult<f64> {
    let mut total = 0i64;
    let mut count = 0u64;
    for age in stream_user_ages(conn) {
        total += age?;
        count += 1;
    }
    if count == 0 {
        return Ok(0.0);
    }
    Ok(total as f64 / count as f64)
}

/// One page of `user_data`.
pub fn paginate_users(conn: &Connection, page_size: u32, offset: u64) -> PdResult<Vec<UserData>> {
    let mut stmt = conn.prepare_cached(PAGE_SQL)?;
    let page = stmt
        .query_map(params![page_size, offset as i64], UserData::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(page)
}

/// Iterator over consecutive batches on one connection.
///
/// Stops at the first empty batch or after an error.
pub struct BatchStream<'c> {
    conn: &'c Connection,
    batch_size: u32,
    offset: u64,
    done: bool,
}

impl Iterator for BatchStream<'_> {
    type Item = PdResult<Vec<UserData>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.batch_size == 0 {
            return None;
        }
        match paginate_users(self.conn, self.batch_size, self.offset) {
            Ok(batch) if batch.is_empty() => {
                self.done = true;
                None
            }
            Ok(batch) => {
                self.offset += batch.len() as u64;
                Some(Ok(batch))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// `user_data` in batches of `batch_size`. A zero size yields nothing.
pub fn stream_users_in_batches(conn: &Connection, batch_size: u32) -> BatchStream<'_> {
    BatchStream {
        conn,
        batch_size,
        offset: 0,
        done: false,
    }
}

/// Users older than [`BATCH_MIN_AGE`], gathered batch by batch.
pub fn batch_processing(conn: &Connection, batch_size: u32) -> PdResult<Vec<UserData>> {
    let mut selected = Vec::new();
    for batch in stream_users_in_batches(conn, batch_size) {
        selected.extend(batch?.into_iter().filter(|u| u.age > BATCH_MIN_AGE));
    }
    Ok(selected)
}

/// Iterator over pages where each page opens its own connection.
pub struct LazyPaginator {
    path: PathBuf,
    page_size: u32,
    offset: u64,
    done: bool,
}

impl LazyPaginator {
    /// Offset of the next page to fetch.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn fetch_page(&self) -> PdResult<Vec<UserData>> {
        let conn = connect_to_prodev(&self.path)?;
        paginate_users(&conn, self.page_size, self.offset)
    }
}

impl Iterator for LazyPaginator {
    type Item = PdResult<Vec<UserData>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.page_size == 0 {
            return None;
        }
        debug!("fetching page at offset {}", self.offset);
        match self.fetch_page() {
            Ok(page) if page.is_empty() => {
                self.done = true;
                None
            }
            Ok(page) => {
                self.offset += u64::from(self.page_size);
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Pages of `page_size` rows from the database at `db`, fetched on demand.
pub fn lazy_paginate(db: impl AsRef<Path>, page_size: u32) -> LazyPaginator {
    LazyPaginator {
        path: db.as_ref().to_path_buf(),
        page_size,
        offset: 0,
        done: false,
    }
}
