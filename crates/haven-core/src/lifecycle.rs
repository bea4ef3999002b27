//! Timed-session lifecycle shared by safety checks, SOS alerts and location shares.
//!
//! Every transition is a pure function of the session and the current time. A
//! transition either applies completely and reports the [`EventKind`] to hand
//! to notification dispatch, or fails and leaves the session untouched.
//!
//! ```text
//! start ─► active ─┬─ resolve  ─► resolved_safe
//!                  ├─ cancel   ─► cancelled
//!                  └─ escalate ─► escalated
//! ```

use chrono::{DateTime, Duration, Utc};

use crate::entities::{NewSession, SessionPayload, TimedSession};
use crate::enums::{EventKind, SessionState};
use crate::errors::CoreError;
use crate::geo::{LocationFix, MOVED_SIGNIFICANTLY_METERS};

/// Outcome of a location update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationUpdate {
    /// Distance between the initial location and this fix, if a reference existed.
    pub distance_from_start_m: Option<f64>,
    /// True only on the update that first crossed the movement threshold.
    pub moved_significantly_now: bool,
}

impl LocationUpdate {
    /// Events to record for this update, in order.
    #[must_use]
    pub fn events(&self) -> Vec<EventKind> {
        let mut events = vec![EventKind::LocationUpdated];
        if self.moved_significantly_now {
            events.push(EventKind::MovedSignificantly);
        }
        events
    }
}

impl TimedSession {
    /// Start a new `Active` session.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if there are no recipients, the deadline
    /// is not in the future, or the initial location is not a valid coordinate.
    pub fn start(id: String, new: NewSession, now: DateTime<Utc>) -> Result<Self, CoreError> {
        if new.recipients.is_empty() {
            return Err(CoreError::Validation(
                "no one to alert: add a trusted contact first (haven contact add)".into(),
            ));
        }
        if let Some(deadline) = new.deadline
            && deadline <= now
        {
            return Err(CoreError::Validation(format!(
                "deadline {} is not in the future",
                deadline.to_rfc3339()
            )));
        }
        if let Some(fix) = &new.initial_location
            && !fix.coordinates().is_valid()
        {
            return Err(CoreError::Validation(format!(
                "invalid initial location ({}, {})",
                fix.lat, fix.lng
            )));
        }
        if let SessionPayload::Sos {
            battery_level: Some(level),
        } = new.payload
        {
            validate_battery(level)?;
        }

        Ok(Self {
            id,
            owner_id: new.owner_id,
            recipients: new.recipients,
            started_at: now,
            deadline: new.deadline,
            duration_secs: new.deadline.map(|deadline| (deadline - now).num_seconds()),
            state: SessionState::Active,
            ended_at: None,
            initial_location: new.initial_location,
            last_location: None,
            moved_significantly: false,
            payload: new.payload,
        })
    }

    /// Mark the owner safe.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` unless the session is `Active`.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> Result<EventKind, CoreError> {
        self.finish(SessionState::ResolvedSafe, now)?;
        Ok(EventKind::Resolved)
    }

    /// Call the session off as a false alarm.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` unless the session is `Active`.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<EventKind, CoreError> {
        self.finish(SessionState::Cancelled, now)?;
        Ok(EventKind::Cancelled)
    }

    /// Alert the recipients. Irreversible: resolve and cancel fail afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` unless the session is `Active`.
    pub fn escalate(&mut self, now: DateTime<Utc>) -> Result<EventKind, CoreError> {
        self.finish(SessionState::Escalated, now)?;
        Ok(EventKind::Escalated)
    }

    /// Push the deadline back by `additional`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidState` if the session is not `Active` or runs
    /// without a deadline, and `CoreError::Validation` if `additional` is not
    /// positive.
    pub fn extend_deadline(&mut self, additional: Duration) -> Result<EventKind, CoreError> {
        self.require_active("extend")?;
        if additional <= Duration::zero() {
            return Err(CoreError::Validation(format!(
                "extension must be positive, got {}s",
                additional.num_seconds()
            )));
        }
        let Some(deadline) = self.deadline else {
            return Err(CoreError::InvalidState(format!(
                "session {} has no deadline to extend",
                self.id
            )));
        };

        self.deadline = Some(deadline + additional);
        self.duration_secs = Some(
            self.duration_secs
                .unwrap_or_else(|| (deadline - self.started_at).num_seconds())
                + additional.num_seconds(),
        );
        Ok(EventKind::DeadlineExtended)
    }

    /// Record a new position and re-evaluate the movement flag.
    ///
    /// The first fix of a session created without a location becomes its
    /// reference point. `moved_significantly` never flips back to false.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidState` unless the session is `Active`, and
    /// `CoreError::Validation` for an out-of-range coordinate.
    pub fn update_location(&mut self, fix: LocationFix) -> Result<LocationUpdate, CoreError> {
        self.require_active("update location of")?;
        if !fix.coordinates().is_valid() {
            return Err(CoreError::Validation(format!(
                "invalid location ({}, {})",
                fix.lat, fix.lng
            )));
        }

        let Some(initial) = self.initial_location else {
            self.initial_location = Some(fix);
            self.last_location = Some(fix);
            return Ok(LocationUpdate {
                distance_from_start_m: None,
                moved_significantly_now: false,
            });
        };

        let distance = initial.distance_to(&fix);
        let moved_now = !self.moved_significantly && distance > MOVED_SIGNIFICANTLY_METERS;
        self.last_location = Some(fix);
        if moved_now {
            self.moved_significantly = true;
        }

        Ok(LocationUpdate {
            distance_from_start_m: Some(distance),
            moved_significantly_now: moved_now,
        })
    }

    /// Record the device battery level on an active SOS session.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidState` unless this is an active SOS session,
    /// and `CoreError::Validation` for a level above 100.
    pub fn set_battery_level(&mut self, level: u8) -> Result<(), CoreError> {
        self.require_active("update battery of")?;
        validate_battery(level)?;
        match &mut self.payload {
            SessionPayload::Sos { battery_level } => {
                *battery_level = Some(level);
                Ok(())
            }
            _ => Err(CoreError::InvalidState(format!(
                "session {} is a {}, not an SOS alert",
                self.id,
                self.kind()
            ))),
        }
    }

    fn finish(&mut self, to: SessionState, now: DateTime<Utc>) -> Result<(), CoreError> {
        if !self.state.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                entity_type: "session".into(),
                id: self.id.clone(),
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        self.ended_at = Some(now);
        Ok(())
    }

    fn require_active(&self, action: &str) -> Result<(), CoreError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CoreError::InvalidState(format!(
                "cannot {action} session {}: it is {}",
                self.id, self.state
            )))
        }
    }
}

fn validate_battery(level: u8) -> Result<(), CoreError> {
    if level > 100 {
        return Err(CoreError::Validation(format!(
            "battery level must be 0-100, got {level}"
        )));
    }
    Ok(())
}
