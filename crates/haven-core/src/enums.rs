//! State enums, session kinds, place categories and event kinds for Haven.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! State enums provide `allowed_next_states()` to enforce valid transitions at
//! the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// State of a timed session (safety check, SOS alert or location share).
///
/// ```text
/// active → resolved_safe
///        → cancelled
///        → escalated
/// ```
///
/// Every state other than `active` is terminal and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    ResolvedSafe,
    Cancelled,
    Escalated,
}

impl SessionState {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Active => &[Self::ResolvedSafe, Self::Cancelled, Self::Escalated],
            Self::ResolvedSafe | Self::Cancelled | Self::Escalated => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ResolvedSafe => "resolved_safe",
            Self::Cancelled => "cancelled",
            Self::Escalated => "escalated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionKind
// ---------------------------------------------------------------------------

/// Which feature a timed session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    SafetyCheck,
    Sos,
    LocationShare,
}

impl SessionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SafetyCheck => "safety_check",
            Self::Sos => "sos",
            Self::LocationShare => "location_share",
        }
    }

    /// Human label used in notification messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SafetyCheck => "Safety check",
            Self::Sos => "SOS alert",
            Self::LocationShare => "Location share",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// A state-relevant occurrence on a session, handed to notification dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Resolved,
    Cancelled,
    Escalated,
    DeadlineExtended,
    LocationUpdated,
    MovedSignificantly,
}

impl EventKind {
    /// Whether recipients of a session of `kind` should be told about this event.
    ///
    /// A safety check stays private until it escalates. SOS recipients hear about
    /// every state change, including the all-clear and a false alarm.
    #[must_use]
    pub const fn notifies_recipients(self, kind: SessionKind) -> bool {
        match self {
            Self::Escalated | Self::MovedSignificantly => true,
            Self::Created | Self::Resolved => !matches!(kind, SessionKind::SafetyCheck),
            Self::Cancelled => matches!(kind, SessionKind::Sos),
            Self::DeadlineExtended | Self::LocationUpdated => false,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Resolved => "resolved",
            Self::Cancelled => "cancelled",
            Self::Escalated => "escalated",
            Self::DeadlineExtended => "deadline_extended",
            Self::LocationUpdated => "location_updated",
            Self::MovedSignificantly => "moved_significantly",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfidenceLevel
// ---------------------------------------------------------------------------

/// How much weight a place score deserves, by number of feedback records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// `high` at 10 or more records, `medium` at 5 to 9, else `low`.
    #[must_use]
    pub const fn from_total(total: u32) -> Self {
        if total >= 10 {
            Self::High
        } else if total >= 5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PlaceCategory
// ---------------------------------------------------------------------------

/// Category of a safe place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Police,
    Hospital,
    SafeSpace,
}

impl PlaceCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Police => "police",
            Self::Hospital => "hospital",
            Self::SafeSpace => "safe_space",
        }
    }

    /// Name used when the source has none.
    #[must_use]
    pub const fn fallback_name(self) -> &'static str {
        match self {
            Self::Police => "Unnamed police station",
            Self::Hospital => "Unnamed hospital",
            Self::SafeSpace => "Unnamed safe space",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
