//! Expiry scanner cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Seconds between two deadline scans while any session is active.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl ScannerConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.interval_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_thirty_seconds() {
        let config = ScannerConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = ScannerConfig { interval_secs: 0 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
