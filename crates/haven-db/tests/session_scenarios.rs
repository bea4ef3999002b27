//! End-to-end session and feedback scenarios against an in-memory store
//! with a manual clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use haven_core::clock::ManualClock;
use haven_core::entities::{NewSession, SessionPayload};
use haven_core::enums::{EventKind, SessionState};
use haven_core::geo::LocationFix;
use haven_db::HavenDb;
use haven_db::feed::Change;
use haven_db::service::HavenService;
use pretty_assertions::assert_eq;

fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 12, 22, 15, 0).unwrap()
}

async fn service() -> (HavenService, Arc<ManualClock>) {
    let db = HavenDb::open_local(":memory:").await.unwrap();
    let clock = Arc::new(ManualClock::new(start_time()));
    (HavenService::from_db(db, clock.clone()), clock)
}

async fn new_session(
    svc: &HavenService,
    deadline: Option<DateTime<Utc>>,
    payload: SessionPayload,
) -> NewSession {
    svc.add_contact("alex", "Sam", "+1 555 0100").await.unwrap();
    NewSession {
        owner_id: "alex".into(),
        recipients: svc.resolve_recipients("alex", &[]).await.unwrap(),
        deadline,
        initial_location: None,
        payload,
    }
}

fn fix(lat: f64, lng: f64) -> LocationFix {
    LocationFix {
        lat,
        lng,
        accuracy_meters: 10.0,
        captured_at: start_time(),
    }
}

#[tokio::test]
async fn overdue_check_in_escalates_exactly_once() {
    let (svc, clock) = service().await;
    let new = new_session(
        &svc,
        Some(start_time() + Duration::minutes(30)),
        SessionPayload::SafetyCheck {
            message: Some("walking home".into()),
        },
    )
    .await;
    let id = svc.start_session(new).await.unwrap().session.id;

    clock.advance(Duration::minutes(31));
    let first = svc.scan_due(None).await.unwrap();
    assert_eq!(first.escalated, vec![id.clone()]);
    assert_eq!(first.changes.len(), 1);
    assert_eq!(first.changes[0].events[0].kind, EventKind::Escalated);

    let stored = svc.get_session(&id).await.unwrap();
    assert_eq!(stored.state, SessionState::Escalated);
    assert_eq!(stored.ended_at, Some(start_time() + Duration::minutes(31)));

    let second = svc.scan_due(None).await.unwrap();
    assert!(second.is_empty());
    assert_eq!(svc.get_session(&id).await.unwrap(), stored);

    // Escalated is irreversible.
    assert!(svc.resolve_session(&id).await.unwrap_err().is_invalid_state());
    assert!(svc.cancel_session(&id).await.unwrap_err().is_invalid_state());
    assert!(
        svc.extend_session(&id, Duration::minutes(5))
            .await
            .unwrap_err()
            .is_invalid_state()
    );
}

#[tokio::test]
async fn open_ended_session_resolves_then_rejects_cancel() {
    let (svc, clock) = service().await;
    let new = new_session(&svc, None, SessionPayload::SafetyCheck { message: None }).await;
    let id = svc.start_session(new).await.unwrap().session.id;

    // Without a deadline the scanner never escalates.
    clock.advance(Duration::days(2));
    assert!(svc.scan_due(None).await.unwrap().is_empty());

    let resolved = svc.resolve_session(&id).await.unwrap();
    assert_eq!(resolved.session.state, SessionState::ResolvedSafe);

    let err = svc.cancel_session(&id).await.unwrap_err();
    assert!(err.is_invalid_state(), "{err}");
    assert_eq!(
        svc.get_session(&id).await.unwrap().state,
        SessionState::ResolvedSafe
    );
}

#[tokio::test]
async fn indefinite_session_cannot_be_extended() {
    let (svc, _clock) = service().await;
    let new = new_session(&svc, None, SessionPayload::Sos { battery_level: None }).await;
    let id = svc.start_session(new).await.unwrap().session.id;

    let err = svc.extend_session(&id, Duration::minutes(10)).await.unwrap_err();
    assert!(err.is_invalid_state());

    let zero = svc.extend_session(&id, Duration::zero()).await.unwrap_err();
    assert!(zero.is_validation());
}

#[tokio::test]
async fn changed_opinion_overwrites_feedback() {
    let (svc, _clock) = service().await;
    svc.submit_feedback("osm-node-7", "user-a", true, &["well lit"])
        .await
        .unwrap();
    let score = svc
        .submit_feedback::<&str>("osm-node-7", "user-a", false, &[])
        .await
        .unwrap();

    assert_eq!(score.total_feedback, 1);
    assert_eq!(score.helpful_count, 0);
    assert_eq!(score.not_helpful_count, 1);
    assert!(score.top_tags.is_empty());
}

#[tokio::test]
async fn sos_reports_movement_once() {
    let (svc, _clock) = service().await;
    let mut feed = svc.subscribe();
    let mut new = new_session(&svc, None, SessionPayload::Sos {
        battery_level: Some(64),
    })
    .await;
    new.initial_location = Some(fix(40.0, -74.0));
    let id = svc.start_session(new).await.unwrap().session.id;

    let near = svc
        .update_session_location(&id, fix(40.0044, -74.0))
        .await
        .unwrap();
    assert!(!near.location.unwrap().moved_significantly_now);
    assert!(!near.session.moved_significantly);

    let far = svc
        .update_session_location(&id, fix(40.0045, -74.0))
        .await
        .unwrap();
    assert!(far.location.unwrap().moved_significantly_now);
    let kinds: Vec<EventKind> = far.events.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::LocationUpdated, EventKind::MovedSignificantly]
    );

    // Walking back does not clear the flag, and does not report it again.
    let back = svc
        .update_session_location(&id, fix(40.0, -74.0))
        .await
        .unwrap();
    assert!(back.session.moved_significantly);
    assert!(!back.location.unwrap().moved_significantly_now);
    assert!(svc.get_session(&id).await.unwrap().moved_significantly);

    let mut moved = 0;
    while let Ok(change) = feed.try_recv() {
        if let Change::Session { event, .. } = change
            && event.kind == EventKind::MovedSignificantly
        {
            moved += 1;
        }
    }
    assert_eq!(moved, 1);
}

#[tokio::test]
async fn store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haven.db");
    let path = path.to_str().unwrap();

    let id = {
        let svc = HavenService::new_local(path).await.unwrap();
        svc.add_contact("alex", "Sam", "5550100").await.unwrap();
        let recipients = svc.resolve_recipients("alex", &[]).await.unwrap();
        let deadline = svc.now() + Duration::hours(1);
        svc.start_session(NewSession {
            owner_id: "alex".into(),
            recipients,
            deadline: Some(deadline),
            initial_location: None,
            payload: SessionPayload::LocationShare { destination: None },
        })
        .await
        .unwrap()
        .session
        .id
    };

    let reopened = HavenService::new_local(path).await.unwrap();
    let session = reopened.get_session(&id).await.unwrap();
    assert_eq!(session.state, SessionState::Active);
    assert_eq!(reopened.session_events(&id).await.unwrap().len(), 1);
}
