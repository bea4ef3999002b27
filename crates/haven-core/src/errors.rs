//! Cross-cutting error types for Haven.
//!
//! This module defines errors that can originate from any crate in the system.
//! Persistence errors (`DatabaseError`) and geodata errors (`GeoError`) live in
//! their respective crates and wrap `CoreError` so callers can still match on
//! the original kind.

use thiserror::Error;

/// Errors that can be raised by any Haven crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// An operation needs the entity in a state it is not in.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Caller input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The device location could not be acquired.
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// True for both flavours of "wrong state" errors.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. } | Self::InvalidState(_))
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Why a location fix could not be obtained.
///
/// The subkind is preserved all the way to the caller: a denied permission
/// calls for a different user action than a fix that never arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("location permission denied: allow location access or pass --lat/--lng explicitly")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {after_secs}s waiting for a location fix; try again outdoors")]
    Timeout { after_secs: u64 },
}
