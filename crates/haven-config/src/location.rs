//! Device location settings.

use std::time::Duration;

use haven_core::geo::Coordinates;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationConfig {
    /// How long to wait for a fix before giving up.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Coordinate used when the device cannot provide one and the caller opts
    /// into a fallback.
    #[serde(default)]
    pub fallback_lat: Option<f64>,

    #[serde(default)]
    pub fallback_lng: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            fallback_lat: None,
            fallback_lng: None,
        }
    }
}

impl LocationConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The fallback coordinate, if both halves are set.
    #[must_use]
    pub fn fallback(&self) -> Option<Coordinates> {
        match (self.fallback_lat, self.fallback_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "location.timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.fallback_lat.is_some() != self.fallback_lng.is_some() {
            return Err(ConfigError::InvalidValue {
                field: "location.fallback_lat/fallback_lng".into(),
                reason: "set both or neither".into(),
            });
        }
        if let Some(fallback) = self.fallback()
            && !fallback.is_valid()
        {
            return Err(ConfigError::InvalidValue {
                field: "location.fallback_lat/fallback_lng".into(),
                reason: format!("({}, {}) is not a valid coordinate", fallback.lat, fallback.lng),
            });
        }
        Ok(())
    }
}
