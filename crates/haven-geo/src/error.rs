//! Geodata and location error types.

use haven_core::errors::LocationError;
use thiserror::Error;

/// Errors that can occur when looking up safe places or the device location.
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The geodata service returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Failed to parse a geodata response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The service returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// No endpoints were configured.
    #[error("no geodata endpoints configured")]
    NoEndpoints,

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl GeoError {
    /// Whether the next endpoint is worth trying after this failure.
    ///
    /// Transport errors, server errors and rate limiting are per-endpoint;
    /// a malformed query or response would fail the same way everywhere.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Parse(_) | Self::NoEndpoints | Self::Location(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        assert!(GeoError::RateLimited { retry_after_secs: 5 }.is_retryable());
        assert!(
            GeoError::Api {
                status: 504,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(
            !GeoError::Api {
                status: 400,
                message: "bad query".into()
            }
            .is_retryable()
        );
        assert!(!GeoError::Parse("eof".into()).is_retryable());
        assert!(!GeoError::Location(LocationError::PermissionDenied).is_retryable());
    }
}
