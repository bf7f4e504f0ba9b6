//! Untyped result rows.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rusqlite::types::ValueRef;
use serde_json::Value;

/// One result row, one JSON value per column in select order.
///
/// Integers and reals become numbers, text becomes strings, blobs become
/// base64 strings and NULL becomes `null`.
pub type Row = Vec<Value>;

/// Convert a SQLite row into a [`Row`].
pub fn row_to_json(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    let columns = row.as_ref().column_count();
    (0..columns)
        .map(|idx| {
            Ok(match row.get_ref(idx)? {
                ValueRef::Null => Value::Null,
                ValueRef::Integer(i) => Value::from(i),
                ValueRef::Real(f) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Value::String(STANDARD.encode(b)),
            })
        })
        .collect()
}
