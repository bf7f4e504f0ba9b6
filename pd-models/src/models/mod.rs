//! Entity model definitions and shared column helpers.

pub mod user;
pub mod conversation;
pub mod message;
pub mod notification;
pub mod message_history;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

/// Format a timestamp for storage.
///
/// Always microsecond precision with a `Z` suffix, so stored values have a
/// fixed width and compare correctly as text.
pub fn to_sql_time(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    row: &Row<'_>,
    col: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    let idx = row.as_ref().column_index(col).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a UUID stored as text.
pub(crate) fn get_uuid(row: &Row<'_>, col: &str) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(col)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(row, col, e))
}

/// Read a nullable UUID stored as text.
pub(crate) fn get_opt_uuid(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(row, col, e)))
        .transpose()
}

/// Read a timestamp stored by [`to_sql_time`].
pub(crate) fn get_time(row: &Row<'_>, col: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(col)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(row, col, e))
}

/// Read a nullable timestamp.
pub(crate) fn get_opt_time(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| conversion_error(row, col, e))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sql_time_is_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        assert_eq!(to_sql_time(&a), "2024-01-02T03:04:05.000000Z");
        assert!(to_sql_time(&a) < to_sql_time(&b));
    }
}
