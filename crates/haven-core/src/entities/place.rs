use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ConfidenceLevel, PlaceCategory};
use crate::geo::Coordinates;

/// A safe place, either user-contributed or returned by the geodata service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Place {
    pub id: String,
    pub category: PlaceCategory,
    pub name: String,
    pub coordinates: Coordinates,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// User who contributed the place; `None` for geodata results.
    pub added_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Community trust signal for a place, derived from all of its feedback.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PlaceScore {
    pub place_id: String,
    pub helpful_count: u32,
    pub not_helpful_count: u32,
    pub total_feedback: u32,
    /// 0 to 100.
    pub unified_score: u32,
    pub confidence_level: ConfidenceLevel,
    pub top_tags: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

impl PlaceScore {
    /// Score of a place nobody has rated yet.
    #[must_use]
    pub fn empty(place_id: &str, computed_at: DateTime<Utc>) -> Self {
        Self {
            place_id: place_id.to_string(),
            helpful_count: 0,
            not_helpful_count: 0,
            total_feedback: 0,
            unified_score: 0,
            confidence_level: ConfidenceLevel::Low,
            top_tags: Vec::new(),
            computed_at,
        }
    }
}
