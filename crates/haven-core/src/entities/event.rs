use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EventKind;

/// A notification-worthy occurrence on a session. Appended to the event log
/// and published to observers; the dispatch mechanism is not the store's concern.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SessionEvent {
    pub id: String,
    pub session_id: String,
    pub kind: EventKind,
    pub detail: Option<serde_json::Value>,
    pub at: DateTime<Utc>,
}
