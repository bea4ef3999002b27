//! Who the local user is.

use haven_core::identity::Identity;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub display_name: String,
}

impl IdentityConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.user_id.trim().is_empty()
    }

    /// Resolve the identity, letting `user_override` (e.g. `--user`) win.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when neither source names a user, and
    /// `ConfigError::InvalidValue` when the id is malformed.
    pub fn resolve(&self, user_override: Option<&str>) -> Result<Identity, ConfigError> {
        let user_id = user_override.unwrap_or(&self.user_id);
        if user_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "identity.user_id".into(),
                hint: "pass --user, set HAVEN_IDENTITY__USER_ID, or add [identity] to .haven/config.toml"
                    .into(),
            });
        }
        let display_name = Some(self.display_name.as_str()).filter(|_| user_override.is_none());
        Identity::new(user_id, display_name).map_err(|e| ConfigError::InvalidValue {
            field: "identity.user_id".into(),
            reason: e.to_string(),
        })
    }
}
