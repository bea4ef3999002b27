//! Text messages for trusted contacts.
//!
//! Haven does not send SMS itself. For every event that should reach a
//! session's recipients it composes the message and an `sms:` link per
//! recipient; opening the link hands the text to the phone's messaging app.

use haven_core::entities::{SessionEvent, SessionPayload, TimedSession};
use haven_core::enums::{EventKind, SessionKind};
use haven_core::geo::MOVED_SIGNIFICANTLY_METERS;
use serde::Serialize;

/// One message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub event: EventKind,
    pub recipient: String,
    pub phone_number: String,
    pub message: String,
    pub sms_link: String,
}

/// `sms:<phone>?body=<urlencoded body>`.
#[must_use]
pub fn sms_link(phone_number: &str, body: &str) -> String {
    format!("sms:{phone_number}?body={}", urlencoding::encode(body))
}

/// Messages for every recipient of `session` about each of `events` that
/// concerns them, signed with `sender`.
#[must_use]
pub fn notifications_for(
    session: &TimedSession,
    events: &[SessionEvent],
    sender: &str,
) -> Vec<Notification> {
    let mut out = Vec::new();
    for event in events {
        let Some(message) = compose(session, event.kind, sender) else {
            continue;
        };
        out.extend(session.recipients.iter().map(|recipient| Notification {
            event: event.kind,
            recipient: recipient.name.clone(),
            phone_number: recipient.phone_number.clone(),
            sms_link: sms_link(&recipient.phone_number, &message),
            message: message.clone(),
        }));
    }
    out
}

/// The text for `event` on `session`, or `None` when recipients are not told.
#[must_use]
pub fn compose(session: &TimedSession, event: EventKind, sender: &str) -> Option<String> {
    let kind = session.kind();
    if !event.notifies_recipients(kind) {
        return None;
    }

    let headline = match (event, kind) {
        (EventKind::Created, SessionKind::Sos) => format!("SOS: {sender} needs help."),
        (EventKind::Created, _) => match session.deadline {
            Some(deadline) => format!(
                "{sender} is sharing their location with you until {} UTC.",
                deadline.format("%H:%M")
            ),
            None => format!("{sender} is sharing their location with you."),
        },
        (EventKind::Escalated, SessionKind::SafetyCheck) => {
            format!("{sender} missed a safety check-in. Please check on them.")
        }
        (EventKind::Escalated, SessionKind::Sos) => {
            format!("SOS: {sender} still needs help and has not checked in.")
        }
        (EventKind::Escalated, SessionKind::LocationShare) => {
            format!("{sender} has not arrived by the expected time. Please check on them.")
        }
        (EventKind::Resolved, _) => format!("{sender} is safe now."),
        (EventKind::Cancelled, _) => {
            format!("False alarm: {sender} is safe. Please ignore the previous SOS.")
        }
        (EventKind::MovedSignificantly, _) => format!(
            "{sender} has moved more than {MOVED_SIGNIFICANTLY_METERS:.0} m from where the alert started."
        ),
        (EventKind::DeadlineExtended | EventKind::LocationUpdated, _) => return None,
    };

    let mut message = headline;
    match &session.payload {
        SessionPayload::SafetyCheck {
            message: Some(note),
        } if event == EventKind::Escalated => {
            message.push_str(&format!(" Their note: \"{note}\"."));
        }
        SessionPayload::Sos {
            battery_level: Some(level),
        } if event != EventKind::Resolved && event != EventKind::Cancelled => {
            message.push_str(&format!(" Battery: {level}%."));
        }
        _ => {}
    }
    if !matches!(event, EventKind::Resolved | EventKind::Cancelled)
        && let Some(fix) = session.latest_location()
    {
        message.push_str(" Last known location: ");
        message.push_str(&fix.coordinates().maps_url());
    }
    Some(message)
}
