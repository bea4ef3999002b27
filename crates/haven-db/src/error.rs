//! Database error types for haven-db.

use haven_core::errors::CoreError;
use thiserror::Error;

/// Errors from store and service operations.
///
/// Domain failures pass through as [`DatabaseError::Core`] so callers can
/// still tell a validation problem from a persistence one.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Domain error raised by a lifecycle, validation or lookup step.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    /// Build a `NotFound` for `entity_type` `id`.
    #[must_use]
    pub fn not_found(entity_type: &str, id: &str) -> Self {
        Self::Core(CoreError::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        })
    }

    /// True when the store itself failed, as opposed to a domain rule.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        !matches!(self, Self::Core(_))
    }

    /// The domain error, if this is one.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(core) => Some(core),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(CoreError::NotFound { .. }))
    }

    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        self.as_core().is_some_and(CoreError::is_invalid_state)
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.as_core().is_some_and(CoreError::is_validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_are_not_persistence_errors() {
        let err: DatabaseError = CoreError::Validation("empty".into()).into();
        assert!(!err.is_persistence());
        assert!(err.is_validation());
        assert!(DatabaseError::Query("bad row".into()).is_persistence());
        assert!(DatabaseError::not_found("session", "ses-1").is_not_found());
    }

    #[test]
    fn core_message_passes_through() {
        let err: DatabaseError = CoreError::InvalidState("no deadline".into()).into();
        assert_eq!(err.to_string(), "Invalid state: no deadline");
        assert!(err.is_invalid_state());
    }
}
