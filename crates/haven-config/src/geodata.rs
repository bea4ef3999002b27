//! Geodata (Overpass API) settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_endpoints() -> Vec<String> {
    vec![
        "https://overpass-api.de/api/interpreter".to_string(),
        "https://overpass.kumi.systems/api/interpreter".to_string(),
    ]
}

const fn default_timeout_secs() -> u64 {
    25
}

const fn default_search_radius_m() -> f64 {
    5_000.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeodataConfig {
    /// Overpass interpreter URLs, tried in order.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Radius used by `place search` when none is given.
    #[serde(default = "default_search_radius_m")]
    pub search_radius_m: f64,
}

impl Default for GeodataConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            timeout_secs: default_timeout_secs(),
            search_radius_m: default_search_radius_m(),
        }
    }
}

impl GeodataConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoints.iter().all(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "geodata.endpoints".into(),
                reason: "at least one endpoint is required".into(),
            });
        }
        if !(self.search_radius_m.is_finite() && self.search_radius_m > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "geodata.search_radius_m".into(),
                reason: "must be a positive number of meters".into(),
            });
        }
        Ok(())
    }
}
