//! Timed session repository.
//!
//! Loads a session, applies a pure transition from `haven_core::lifecycle`,
//! and writes the result back with a compare-and-set on `state = 'active'`
//! together with the produced event rows in one transaction.

use chrono::{DateTime, Duration, Utc};
use haven_core::entities::{NewSession, SessionEvent, TimedSession};
use haven_core::enums::{EventKind, SessionState};
use haven_core::errors::CoreError;
use haven_core::geo::LocationFix;
use haven_core::ids::PREFIX_SESSION;
use haven_core::lifecycle::LocationUpdate;
use serde_json::json;

use crate::error::DatabaseError;
use crate::feed::Change;
use crate::helpers::{
    get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_datetime,
    parse_optional_json, to_json,
};
use crate::repos::event::append_event;
use crate::service::HavenService;

const SESSION_COLUMNS: &str = "id, owner_id, state, recipients, started_at, deadline, duration_secs, \
     ended_at, initial_location, last_location, moved_significantly, payload";

/// A committed session change and the events it produced, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionChange {
    pub session: TimedSession,
    pub events: Vec<SessionEvent>,
    /// Present for location updates.
    pub location: Option<LocationUpdate>,
}

/// What a transition wants recorded.
#[derive(Debug, Default)]
pub(crate) struct Outcome {
    pub(crate) events: Vec<(EventKind, Option<serde_json::Value>)>,
    pub(crate) location: Option<LocationUpdate>,
}

impl Outcome {
    pub(crate) fn single(kind: EventKind, detail: Option<serde_json::Value>) -> Self {
        Self {
            events: vec![(kind, detail)],
            location: None,
        }
    }
}

impl HavenService {
    /// Start a session and record its `created` event.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` (wrapped) if there are no recipients,
    /// the deadline is not in the future, or the payload is out of range.
    pub async fn start_session(&self, new: NewSession) -> Result<SessionChange, DatabaseError> {
        let now = self.now();
        let id = self.db().generate_id(PREFIX_SESSION).await?;
        let session = TimedSession::start(id, new, now)?;
        let detail = json!({
            "recipients": session.recipients.len(),
            "deadline": session.deadline,
        });

        let tx = self.db().begin().await?;
        let result: Result<SessionChange, DatabaseError> = async {
            insert_session(&tx, &session, now).await?;
            let event = append_event(&tx, &session.id, EventKind::Created, Some(detail), now).await?;
            Ok(SessionChange {
                session,
                events: vec![event],
                location: None,
            })
        }
        .await;
        let change = tx.finish(result).await?;

        tracing::info!(
            session = %change.session.id,
            kind = %change.session.kind(),
            deadline = ?change.session.deadline,
            "session started"
        );
        self.publish_session_change(&change);
        Ok(change)
    }

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` (wrapped) if the session does not exist.
    pub async fn get_session(&self, id: &str) -> Result<TimedSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("session", id))?;
        row_to_session(&row)
    }

    /// Sessions of `owner_id`, newest first, optionally filtered by state.
    ///
    /// This is a plain read: it does not run the expiry scan. Use
    /// [`HavenService::active_sessions`] for the live view.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sessions(
        &self,
        owner_id: &str,
        state: Option<SessionState>,
        limit: u32,
    ) -> Result<Vec<TimedSession>, DatabaseError> {
        let mut rows = match state {
            Some(state) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SESSION_COLUMNS} FROM sessions
                             WHERE owner_id = ?1 AND state = ?2
                             ORDER BY started_at DESC, rowid DESC LIMIT ?3"
                        ),
                        libsql::params![owner_id, state.as_str(), i64::from(limit)],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SESSION_COLUMNS} FROM sessions WHERE owner_id = ?1
                             ORDER BY started_at DESC, rowid DESC LIMIT ?2"
                        ),
                        libsql::params![owner_id, i64::from(limit)],
                    )
                    .await?
            }
        };

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }

    /// Every `Active` session, optionally of one owner, oldest first.
    pub(crate) async fn load_active(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<TimedSession>, DatabaseError> {
        let mut rows = match owner_id {
            Some(owner) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SESSION_COLUMNS} FROM sessions
                             WHERE state = 'active' AND owner_id = ?1
                             ORDER BY started_at ASC, rowid ASC"
                        ),
                        [owner],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SESSION_COLUMNS} FROM sessions WHERE state = 'active'
                             ORDER BY started_at ASC, rowid ASC"
                        ),
                        (),
                    )
                    .await?
            }
        };

        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }

    /// The owner checked in: `active → resolved_safe`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless the session is `Active`.
    pub async fn resolve_session(&self, id: &str) -> Result<SessionChange, DatabaseError> {
        self.apply(id, |session, now| {
            Ok(Outcome::single(session.resolve(now)?, None))
        })
        .await
    }

    /// False alarm: `active → cancelled`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless the session is `Active`.
    pub async fn cancel_session(&self, id: &str) -> Result<SessionChange, DatabaseError> {
        self.apply(id, |session, now| {
            Ok(Outcome::single(session.cancel(now)?, None))
        })
        .await
    }

    /// "Send alert now": escalate without waiting for the deadline.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless the session is `Active`.
    pub async fn escalate_session(&self, id: &str) -> Result<SessionChange, DatabaseError> {
        self.apply(id, |session, now| {
            Ok(Outcome::single(
                session.escalate(now)?,
                Some(json!({ "trigger": "manual" })),
            ))
        })
        .await
    }

    /// Push the deadline back by `additional`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless the session is `Active` with a
    /// deadline, and a validation error unless `additional` is positive.
    pub async fn extend_session(
        &self,
        id: &str,
        additional: Duration,
    ) -> Result<SessionChange, DatabaseError> {
        self.apply(id, move |session, _now| {
            let kind = session.extend_deadline(additional)?;
            Ok(Outcome::single(
                kind,
                Some(json!({
                    "added_secs": additional.num_seconds(),
                    "deadline": session.deadline,
                })),
            ))
        })
        .await
    }

    /// Record a new position for an active session.
    ///
    /// The returned change carries the [`LocationUpdate`]; its
    /// `moved_significantly_now` is true only on the first crossing of the
    /// movement threshold.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless the session is `Active`, and a
    /// validation error for an out-of-range coordinate.
    pub async fn update_session_location(
        &self,
        id: &str,
        fix: LocationFix,
    ) -> Result<SessionChange, DatabaseError> {
        self.apply(id, move |session, _now| {
            let update = session.update_location(fix)?;
            let detail = json!({
                "lat": fix.lat,
                "lng": fix.lng,
                "accuracy_meters": fix.accuracy_meters,
                "distance_from_start_m": update.distance_from_start_m,
            });
            Ok(Outcome {
                events: update
                    .events()
                    .into_iter()
                    .map(|kind| (kind, Some(detail.clone())))
                    .collect(),
                location: Some(update),
            })
        })
        .await
    }

    /// Record the device battery level on an active SOS session.
    ///
    /// No event is produced: the level travels with the next notification.
    ///
    /// # Errors
    ///
    /// Returns an invalid-state error unless this is an active SOS session.
    pub async fn set_session_battery(
        &self,
        id: &str,
        level: u8,
    ) -> Result<TimedSession, DatabaseError> {
        let change = self
            .apply(id, move |session, _now| {
                session.set_battery_level(level)?;
                Ok(Outcome::default())
            })
            .await?;
        Ok(change.session)
    }

    /// Load, transition, and write back one session.
    async fn apply<F>(&self, id: &str, op: F) -> Result<SessionChange, DatabaseError>
    where
        F: FnOnce(&mut TimedSession, DateTime<Utc>) -> Result<Outcome, CoreError> + Send,
    {
        let now = self.now();
        let mut session = self.get_session(id).await?;
        let outcome = op(&mut session, now)?;

        if let Some(change) = self.persist(&session, None, outcome, now).await? {
            tracing::debug!(
                session = id,
                state = %change.session.state,
                events = change.events.len(),
                "session updated"
            );
            self.publish_session_change(&change);
            return Ok(change);
        }

        // Another writer moved the session out of `active` after we loaded it.
        let current = self.get_session(id).await?;
        Err(CoreError::InvalidTransition {
            entity_type: "session".into(),
            id: id.to_string(),
            from: current.state.to_string(),
            to: session.state.to_string(),
        }
        .into())
    }

    /// Write `session` if its row is still `active` (and, when given, still
    /// carries `expected_deadline`). Returns `None` when the guard did not match.
    pub(crate) async fn persist(
        &self,
        session: &TimedSession,
        expected_deadline: Option<DateTime<Utc>>,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionChange>, DatabaseError> {
        let tx = self.db().begin().await?;
        let result: Result<Option<SessionChange>, DatabaseError> = async {
            let mut sql = String::from(
                "UPDATE sessions SET state = ?2, deadline = ?3, duration_secs = ?4, ended_at = ?5,
                        initial_location = ?6, last_location = ?7, moved_significantly = ?8,
                        payload = ?9, updated_at = ?10
                 WHERE id = ?1 AND state = 'active'",
            );
            let mut params: Vec<libsql::Value> = vec![
                session.id.clone().into(),
                session.state.as_str().into(),
                session.deadline.map(|d| d.to_rfc3339()).into(),
                session.duration_secs.into(),
                session.ended_at.map(|d| d.to_rfc3339()).into(),
                encode_optional(session.initial_location.as_ref())?.into(),
                encode_optional(session.last_location.as_ref())?.into(),
                i64::from(session.moved_significantly).into(),
                to_json(&session.payload)?.into(),
                now.to_rfc3339().into(),
            ];
            if let Some(expected) = expected_deadline {
                sql.push_str(" AND deadline = ?11");
                params.push(expected.to_rfc3339().into());
            }

            let updated = tx.execute(&sql, libsql::params_from_iter(params)).await?;
            if updated == 0 {
                return Ok(None);
            }

            let mut events = Vec::with_capacity(outcome.events.len());
            for (kind, detail) in outcome.events {
                events.push(append_event(&tx, &session.id, kind, detail, now).await?);
            }
            Ok(Some(SessionChange {
                session: session.clone(),
                events,
                location: outcome.location,
            }))
        }
        .await;
        tx.finish(result).await
    }

    pub(crate) fn publish_session_change(&self, change: &SessionChange) {
        for event in &change.events {
            self.publish(Change::Session {
                event: event.clone(),
                session: Box::new(change.session.clone()),
            });
        }
    }
}

async fn insert_session(
    conn: &libsql::Connection,
    session: &TimedSession,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let params: Vec<libsql::Value> = vec![
        session.id.clone().into(),
        session.owner_id.clone().into(),
        session.kind().as_str().into(),
        session.state.as_str().into(),
        to_json(&session.recipients)?.into(),
        session.started_at.to_rfc3339().into(),
        session.deadline.map(|d| d.to_rfc3339()).into(),
        session.duration_secs.into(),
        encode_optional(session.initial_location.as_ref())?.into(),
        encode_optional(session.last_location.as_ref())?.into(),
        i64::from(session.moved_significantly).into(),
        to_json(&session.payload)?.into(),
        now.to_rfc3339().into(),
    ];
    conn.execute(
        "INSERT INTO sessions (id, owner_id, kind, state, recipients, started_at, deadline,
                               duration_secs, initial_location, last_location,
                               moved_significantly, payload, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        libsql::params_from_iter(params),
    )
    .await?;
    Ok(())
}

fn encode_optional(fix: Option<&LocationFix>) -> Result<Option<String>, DatabaseError> {
    fix.map(to_json).transpose()
}

fn row_to_session(row: &libsql::Row) -> Result<TimedSession, DatabaseError> {
    let initial = get_opt_string(row, 8)?;
    let last = get_opt_string(row, 9)?;
    let ended_at = get_opt_string(row, 7)?;
    let deadline = get_opt_string(row, 5)?;
    Ok(TimedSession {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        state: parse_enum(&row.get::<String>(2)?)?,
        recipients: parse_json(&row.get::<String>(3)?)?,
        started_at: parse_datetime(&row.get::<String>(4)?)?,
        deadline: parse_optional_datetime(deadline.as_deref())?,
        duration_secs: row.get::<Option<i64>>(6)?,
        ended_at: parse_optional_datetime(ended_at.as_deref())?,
        initial_location: parse_optional_json(initial.as_deref())?,
        last_location: parse_optional_json(last.as_deref())?,
        moved_significantly: row.get::<i64>(10)? != 0,
        payload: parse_json(&row.get::<String>(11)?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use haven_core::entities::{Recipient, SessionPayload};
    use haven_core::enums::{EventKind, SessionState};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::feed::Change;
    use crate::test_support::{t0, test_service};

    fn recipients() -> Vec<Recipient> {
        vec![Recipient {
            id: "cnt-1".into(),
            name: "Sam".into(),
            phone_number: "+15550100".into(),
        }]
    }

    fn check_in(minutes: i64) -> NewSession {
        NewSession {
            owner_id: "alex".into(),
            recipients: recipients(),
            deadline: Some(t0() + Duration::minutes(minutes)),
            initial_location: None,
            payload: SessionPayload::SafetyCheck { message: None },
        }
    }

    fn kinds(events: &[SessionEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    #[tokio::test]
    async fn start_persists_session_and_created_event() {
        let (svc, _clock) = test_service().await;
        let change = svc.start_session(check_in(30)).await.unwrap();

        assert_eq!(change.session.state, SessionState::Active);
        assert_eq!(kinds(&change.events), vec![EventKind::Created]);
        assert_eq!(svc.get_session(&change.session.id).await.unwrap(), change.session);
        assert_eq!(svc.session_events(&change.session.id).await.unwrap(), change.events);
    }

    #[tokio::test]
    async fn start_without_recipients_stores_nothing() {
        let (svc, _clock) = test_service().await;
        let mut new = check_in(30);
        new.recipients.clear();
        let err = svc.start_session(new).await.unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("haven contact add"));
        assert!(svc.list_sessions("alex", None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_then_cancel_is_rejected_and_row_unchanged() {
        let (svc, clock) = test_service().await;
        let id = svc.start_session(check_in(30)).await.unwrap().session.id;

        clock.advance(Duration::minutes(10));
        let resolved = svc.resolve_session(&id).await.unwrap();
        assert_eq!(resolved.session.state, SessionState::ResolvedSafe);
        assert_eq!(resolved.session.ended_at, Some(t0() + Duration::minutes(10)));

        let err = svc.cancel_session(&id).await.unwrap_err();
        assert!(err.is_invalid_state(), "{err}");
        assert_eq!(svc.get_session(&id).await.unwrap(), resolved.session);
        assert_eq!(
            kinds(&svc.session_events(&id).await.unwrap()),
            vec![EventKind::Created, EventKind::Resolved]
        );
    }

    #[tokio::test]
    async fn extend_moves_deadline_and_duration_exactly() {
        let (svc, _clock) = test_service().await;
        let id = svc.start_session(check_in(30)).await.unwrap().session.id;

        let change = svc.extend_session(&id, Duration::minutes(15)).await.unwrap();
        assert_eq!(change.session.deadline, Some(t0() + Duration::minutes(45)));
        assert_eq!(change.session.duration_secs, Some(45 * 60));
        assert_eq!(kinds(&change.events), vec![EventKind::DeadlineExtended]);

        let stored = svc.get_session(&id).await.unwrap();
        assert_eq!(stored.deadline, change.session.deadline);
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let (svc, _clock) = test_service().await;
        assert!(svc.resolve_session("ses-nothere").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_sessions_filters_by_owner_and_state() {
        let (svc, clock) = test_service().await;
        let first = svc.start_session(check_in(30)).await.unwrap().session.id;
        clock.advance(Duration::minutes(1));
        let second = svc.start_session(check_in(30)).await.unwrap().session.id;
        svc.cancel_session(&first).await.unwrap();

        let all = svc.list_sessions("alex", None, 10).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);

        let active = svc
            .list_sessions("alex", Some(SessionState::Active), 10)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second);
        assert!(svc.list_sessions("kim", None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transitions_are_published_in_order() {
        let (svc, _clock) = test_service().await;
        let mut feed = svc.subscribe();
        let id = svc.start_session(check_in(30)).await.unwrap().session.id;
        svc.escalate_session(&id).await.unwrap();

        let mut seen = Vec::new();
        for _ in 0..2 {
            match feed.recv().await.unwrap() {
                Change::Session { event, session } => {
                    assert_eq!(session.id, id);
                    seen.push(event.kind);
                }
                Change::Score(_) => panic!("unexpected score change"),
            }
        }
        assert_eq!(seen, vec![EventKind::Created, EventKind::Escalated]);
    }

    #[tokio::test]
    async fn battery_level_only_on_sos() {
        let (svc, _clock) = test_service().await;
        let check = svc.start_session(check_in(30)).await.unwrap().session.id;
        assert!(svc.set_session_battery(&check, 50).await.unwrap_err().is_invalid_state());

        let mut sos = check_in(30);
        sos.deadline = None;
        sos.payload = SessionPayload::Sos { battery_level: None };
        let id = svc.start_session(sos).await.unwrap().session.id;
        let updated = svc.set_session_battery(&id, 37).await.unwrap();
        assert_eq!(updated.payload, SessionPayload::Sos { battery_level: Some(37) });
        assert_eq!(svc.session_events(&id).await.unwrap().len(), 1);
    }
}
