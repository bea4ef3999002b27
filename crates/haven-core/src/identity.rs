use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The local user on whose behalf sessions, contacts and feedback are recorded.
///
/// Produced by `haven-config`, consumed by `haven-cli` and `haven-db`.
/// There is no authentication; the id only scopes data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    /// Name shown in messages sent to trusted contacts.
    pub display_name: Option<String>,
}

impl Identity {
    /// Build an identity, rejecting blank ids.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `user_id` is empty or whitespace.
    pub fn new(user_id: &str, display_name: Option<&str>) -> Result<Self, CoreError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(CoreError::Validation("user id must not be empty".into()));
        }
        if user_id.chars().any(char::is_whitespace) {
            return Err(CoreError::Validation(format!(
                "user id '{user_id}' must not contain whitespace"
            )));
        }
        Ok(Self {
            user_id: user_id.to_string(),
            display_name: display_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        })
    }

    /// Name to sign outgoing messages with.
    #[must_use]
    pub fn signature(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_keeps_display_name() {
        let id = Identity::new("  alex ", Some(" Alex R ")).unwrap();
        assert_eq!(id.user_id, "alex");
        assert_eq!(id.signature(), "Alex R");
    }

    #[test]
    fn blank_display_name_falls_back_to_user_id() {
        let id = Identity::new("alex", Some("   ")).unwrap();
        assert_eq!(id.display_name, None);
        assert_eq!(id.signature(), "alex");
    }

    #[test]
    fn rejects_empty_and_spaced_ids() {
        assert!(Identity::new("", None).unwrap_err().is_validation());
        assert!(Identity::new("a b", None).unwrap_err().is_validation());
    }
}
