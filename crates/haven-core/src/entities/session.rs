use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{SessionKind, SessionState};
use crate::geo::{Coordinates, LocationFix};

/// A person to alert, copied from the owner's trusted contacts when the
/// session is created.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub phone_number: String,
}

/// Feature-specific data carried by a session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionPayload {
    SafetyCheck { message: Option<String> },
    Sos { battery_level: Option<u8> },
    LocationShare { destination: Option<Coordinates> },
}

impl SessionPayload {
    #[must_use]
    pub const fn kind(&self) -> SessionKind {
        match self {
            Self::SafetyCheck { .. } => SessionKind::SafetyCheck,
            Self::Sos { .. } => SessionKind::Sos,
            Self::LocationShare { .. } => SessionKind::LocationShare,
        }
    }
}

/// One safety check, SOS alert or location share.
///
/// Starts `Active`; ends in exactly one of the absorbing terminal states.
/// Mutate it only through the transitions in [`crate::lifecycle`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TimedSession {
    pub id: String,
    pub owner_id: String,
    pub recipients: Vec<Recipient>,
    pub started_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    /// Scheduled length in seconds; grows with every deadline extension.
    pub duration_secs: Option<i64>,
    pub state: SessionState,
    pub ended_at: Option<DateTime<Utc>>,
    pub initial_location: Option<LocationFix>,
    pub last_location: Option<LocationFix>,
    pub moved_significantly: bool,
    pub payload: SessionPayload,
}

impl TimedSession {
    #[must_use]
    pub const fn kind(&self) -> SessionKind {
        self.payload.kind()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active)
    }

    /// Active with a deadline at or before `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Most recent known position: the last fix, else the initial one.
    #[must_use]
    pub fn latest_location(&self) -> Option<&LocationFix> {
        self.last_location.as_ref().or(self.initial_location.as_ref())
    }
}

/// Input for starting a session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub owner_id: String,
    pub recipients: Vec<Recipient>,
    pub deadline: Option<DateTime<Utc>>,
    pub initial_location: Option<LocationFix>,
    pub payload: SessionPayload,
}
