use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Recipient;

/// Someone the user trusts to be alerted on their behalf.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TrustedContact {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

impl TrustedContact {
    /// Snapshot the contact as a session recipient.
    #[must_use]
    pub fn to_recipient(&self) -> Recipient {
        Recipient {
            id: self.id.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

/// Strip the punctuation people type into phone numbers, keeping a leading `+`.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.trim()
        .chars()
        .enumerate()
        .filter(|(i, c)| c.is_ascii_digit() || (*i == 0 && *c == '+'))
        .map(|(_, c)| c)
        .collect()
}
