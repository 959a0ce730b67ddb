//! Row parsing and value conversion helpers.
//!
//! `created_on` is written as RFC 3339 with fixed microsecond precision so that
//! text order equals time order. Parsing also accepts `SQLite`'s
//! `datetime('now')` format for rows written by hand.

use chrono::{DateTime, SecondsFormat, Utc};
use rowlog_core::entity::Snapshot;
use rowlog_core::errors::CoreError;
use rowlog_core::log_table::is_identifier;
use rowlog_core::value::FieldValue;

use crate::error::DatabaseError;

/// Format a timestamp for storage in a TEXT column.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Parse a JSON object column. NULL and empty text read as an empty object.
///
/// # Errors
///
/// Returns `DatabaseError::Query` for invalid JSON or a non-object value.
pub fn parse_snapshot(s: Option<&str>) -> Result<Snapshot, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => match serde_json::from_str(s) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(DatabaseError::Query(format!(
                "Expected JSON object in snapshot column, got {other}"
            ))),
            Err(e) => Err(DatabaseError::Query(format!("Invalid JSON in column: {e}"))),
        },
        _ => Ok(Snapshot::new()),
    }
}

/// Convert a column value into the libSQL value written to the entity table.
///
/// Everything without a native `SQLite` type is stored as its encoded text.
#[must_use]
pub fn field_value_to_sql(value: &FieldValue) -> libsql::Value {
    match value {
        FieldValue::Null => libsql::Value::Null,
        FieldValue::Bool(b) => libsql::Value::Integer(i64::from(*b)),
        FieldValue::Integer(i) => libsql::Value::Integer(*i),
        FieldValue::Real(r) if r.is_finite() => libsql::Value::Real(*r),
        FieldValue::Real(_) => libsql::Value::Null,
        FieldValue::Text(s) | FieldValue::Enum(s) => libsql::Value::Text(s.clone()),
        FieldValue::Json(v) => libsql::Value::Text(v.to_string()),
        other => match other.encode() {
            Ok(serde_json::Value::String(s)) => libsql::Value::Text(s),
            Ok(v) => libsql::Value::Text(v.to_string()),
            Err(_) => libsql::Value::Null,
        },
    }
}

/// Reject names that would be unsafe to interpolate into SQL.
///
/// # Errors
///
/// Returns `CoreError::InvalidIdentifier` for the first offending name.
pub fn ensure_identifiers<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), CoreError> {
    for name in names {
        if !is_identifier(name) {
            return Err(CoreError::InvalidIdentifier(name.to_string()));
        }
    }
    Ok(())
}
