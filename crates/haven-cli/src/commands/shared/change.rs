use haven_core::entities::{SessionEvent, TimedSession};
use haven_db::repos::session::SessionChange;
use haven_db::scanner::ScanReport;
use serde::Serialize;

use crate::context::AppContext;
use crate::notify::{Notification, notifications_for};

/// A committed session change as shown to the user.
#[derive(Debug, Serialize)]
pub struct SessionChangeResponse {
    pub session: TimedSession,
    pub events: Vec<SessionEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_from_start_m: Option<f64>,
    pub notifications: Vec<Notification>,
}

impl SessionChangeResponse {
    pub fn new(change: SessionChange, ctx: &AppContext) -> Self {
        let notifications =
            notifications_for(&change.session, &change.events, sender_for(ctx, &change.session));
        Self {
            distance_from_start_m: change
                .location
                .and_then(|update| update.distance_from_start_m)
                .map(round_meters),
            session: change.session,
            events: change.events,
            notifications,
        }
    }
}

/// Name to sign messages about `session` with.
pub fn sender_for<'a>(ctx: &'a AppContext, session: &'a TimedSession) -> &'a str {
    if session.owner_id == ctx.owner() {
        ctx.identity.signature()
    } else {
        &session.owner_id
    }
}

/// Tell the user about escalations an opportunistic scan just performed.
///
/// Goes to stderr so that the command's own output stays parseable.
pub fn announce_scan(report: &ScanReport, ctx: &AppContext, quiet: bool) {
    for failure in &report.failures {
        tracing::warn!(session = %failure.session_id, error = %failure.error, "could not escalate overdue session");
    }
    if quiet {
        return;
    }
    for change in &report.changes {
        eprintln!("session {} escalated: its deadline passed", change.session.id);
        for n in notifications_for(&change.session, &change.events, sender_for(ctx, &change.session)) {
            eprintln!("  notify {} ({}): {}", n.recipient, n.phone_number, n.sms_link);
        }
    }
}

/// Meters to one decimal place.
pub fn round_meters(meters: f64) -> f64 {
    (meters * 10.0).round() / 10.0
}
