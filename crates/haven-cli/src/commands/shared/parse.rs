use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// Parse a `snake_case` enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse an RFC 3339 timestamp such as `2026-05-04T23:30:00+02:00`.
pub fn parse_timestamp(raw: &str, field: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}' (expected RFC 3339): {error}"))
}
