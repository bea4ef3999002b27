//! # haven-config
//!
//! Layered configuration loading for Haven using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`HAVEN_*` prefix, `__` as separator)
//! 2. Project-level `.haven/config.toml`
//! 3. User-level `~/.config/haven/config.toml`
//! 4. Built-in defaults
//!
//! `HAVEN_SCANNER__INTERVAL_SECS=5` maps to `scanner.interval_secs`,
//! `HAVEN_IDENTITY__USER_ID=alex` to `identity.user_id`.
//!
//! ```no_run
//! use haven_config::HavenConfig;
//!
//! let config = HavenConfig::load_with_dotenv().expect("config");
//! println!("database at {}", config.database.path);
//! ```

mod database;
mod error;
mod general;
mod geodata;
mod identity;
mod location;
mod scanner;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use geodata::GeodataConfig;
pub use identity::IdentityConfig;
pub use location::LocationConfig;
pub use scanner::ScannerConfig;

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".haven/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HavenConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub geodata: GeodataConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl HavenConfig {
    /// Load and validate configuration from all sources.
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` for malformed sources and
    /// `ConfigError::InvalidValue` for out-of-range values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading `.env` from the working directory.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate a config from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment or layer extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        Self::figment_for(Self::global_config_path().as_deref(), Path::new(PROJECT_CONFIG_PATH))
    }

    fn figment_for(global_path: Option<&Path>, project_path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = global_path
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        if project_path.exists() {
            figment = figment.merge(Toml::file(project_path));
        }

        figment.merge(Env::prefixed("HAVEN_").split("__"))
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError::InvalidValue` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scanner.validate()?;
        self.location.validate()?;
        self.geodata.validate()?;
        if self.general.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.default_limit".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("haven").join("config.toml"))
    }
}
