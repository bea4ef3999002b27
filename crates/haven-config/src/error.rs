//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment could not merge or extract the layered sources.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A value the caller needs was not set anywhere.
    #[error("'{field}' is not set: {hint}")]
    Missing { field: String, hint: String },

    /// A value was set but is out of range.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
