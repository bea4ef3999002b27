//! Row-to-entity parsing helpers.
//!
//! Repos read `libsql::Row` columns by index. These helpers isolate parsing
//! of timestamps, snake_case enums and JSON-encoded columns.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DatabaseError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-02-09T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-02-09 14:30:00"`).
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

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with every haven-core enum that uses `#[serde(rename_all = "snake_case")]`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
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

/// Decode a JSON TEXT column into `T`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` for malformed JSON.
pub fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Query(format!("Invalid JSON in column: {e}")))
}

/// Decode a nullable JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string contains invalid JSON.
pub fn parse_optional_json<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => parse_json(s).map(Some),
        _ => Ok(None),
    }
}

/// Encode a value for a JSON TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value)
        .map_err(|e| DatabaseError::Query(format!("Failed to encode JSON column: {e}")))
}

/// Read an INTEGER column that holds a non-negative count.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value is negative or too large.
pub fn get_count(row: &libsql::Row, idx: i32) -> Result<u32, DatabaseError> {
    let raw = row.get::<i64>(idx)?;
    u32::try_from(raw).map_err(|_| DatabaseError::Query(format!("column {idx}: {raw} is not a count")))
}

/// True for libSQL errors raised by a UNIQUE constraint.
#[must_use]
pub fn is_unique_violation(error: &libsql::Error) -> bool {
    error.to_string().contains("UNIQUE constraint failed")
}
