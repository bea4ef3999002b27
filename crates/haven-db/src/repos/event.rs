//! Session event log.
//!
//! Append-only. Rows are written inside the transaction of the session change
//! that produced them, so the log never disagrees with the session row.

use chrono::{DateTime, Utc};
use haven_core::entities::SessionEvent;
use haven_core::enums::EventKind;
use haven_core::ids::PREFIX_EVENT;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_json};
use crate::service::HavenService;

const EVENT_COLUMNS: &str = "id, session_id, kind, detail, at";

/// Filter criteria for event queries.
#[derive(Debug, Default)]
pub struct EventFilter {
    pub session_id: Option<String>,
    pub kind: Option<EventKind>,
    pub limit: Option<u32>,
}

/// Insert one event row on `conn`, which is normally an open transaction.
pub(crate) async fn append_event(
    conn: &libsql::Connection,
    session_id: &str,
    kind: EventKind,
    detail: Option<serde_json::Value>,
    at: DateTime<Utc>,
) -> Result<SessionEvent, DatabaseError> {
    let event = SessionEvent {
        id: crate::generate_id(conn, PREFIX_EVENT).await?,
        session_id: session_id.to_string(),
        kind,
        detail,
        at,
    };
    conn.execute(
        "INSERT INTO session_events (id, session_id, kind, detail, at) VALUES (?1, ?2, ?3, ?4, ?5)",
        libsql::params![
            event.id.as_str(),
            event.session_id.as_str(),
            event.kind.as_str(),
            event.detail.as_ref().map(ToString::to_string),
            event.at.to_rfc3339()
        ],
    )
    .await?;
    Ok(event)
}

impl HavenService {
    /// Events matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<SessionEvent>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref sid) = filter.session_id {
            params.push(libsql::Value::Text(sid.clone()));
            conditions.push(format!("session_id = ?{}", params.len()));
        }
        if let Some(kind) = filter.kind {
            params.push(libsql::Value::Text(kind.as_str().to_string()));
            conditions.push(format!("kind = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.unwrap_or(100);
        // Newest `limit` rows, returned in chronological order.
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM (
                 SELECT {EVENT_COLUMNS}, rowid AS seq FROM session_events {where_clause}
                 ORDER BY at DESC, seq DESC LIMIT {limit}
             ) ORDER BY at ASC, seq ASC"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(row_to_event(&row)?);
        }
        Ok(events)
    }

    /// Full event history of one session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn session_events(&self, session_id: &str) -> Result<Vec<SessionEvent>, DatabaseError> {
        self.list_events(&EventFilter {
            session_id: Some(session_id.to_string()),
            kind: None,
            limit: Some(u32::MAX),
        })
        .await
    }
}

fn row_to_event(row: &libsql::Row) -> Result<SessionEvent, DatabaseError> {
    let detail = get_opt_string(row, 3)?;
    Ok(SessionEvent {
        id: row.get(0)?,
        session_id: row.get(1)?,
        kind: parse_enum(&row.get::<String>(2)?)?,
        detail: parse_optional_json(detail.as_deref())?,
        at: parse_datetime(&row.get::<String>(4)?)?,
    })
}
