use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Maximum number of tags one feedback record may carry.
pub const MAX_FEEDBACK_TAGS: usize = 3;

/// One user's opinion of one place. At most one per `(place_id, user_id)`;
/// a repeat submission overwrites.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub place_id: String,
    pub user_id: String,
    pub is_helpful: bool,
    pub tags: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Trim, drop empties and de-duplicate tags, then enforce the size limit.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if more than three distinct tags remain.
    pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, CoreError> {
        let mut tags: Vec<String> = Vec::new();
        for tag in raw {
            let tag = tag.as_ref().trim();
            if tag.is_empty() || tags.iter().any(|t| t == tag) {
                continue;
            }
            tags.push(tag.to_string());
        }
        if tags.len() > MAX_FEEDBACK_TAGS {
            return Err(CoreError::Validation(format!(
                "at most {MAX_FEEDBACK_TAGS} tags per feedback, got {}",
                tags.len()
            )));
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_tags_dedupes_and_trims() {
        let tags = FeedbackRecord::normalize_tags(&[" open 24h", "open 24h", "", "staff helpful"])
            .unwrap();
        assert_eq!(tags, vec!["open 24h".to_string(), "staff helpful".to_string()]);
    }

    #[test]
    fn normalize_tags_rejects_more_than_three() {
        let err = FeedbackRecord::normalize_tags(&["a", "b", "c", "d"]).unwrap_err();
        assert!(err.is_validation());
    }
}
