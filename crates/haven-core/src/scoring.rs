//! Community helpfulness score for places.
//!
//! The score is always recomputed from the complete feedback set. The tag
//! threshold and the confidence band depend on the current total, so there is
//! no correct incremental update.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::entities::{FeedbackRecord, PlaceScore};
use crate::enums::ConfidenceLevel;

/// Feedback updated within this many days counts as recent.
pub const RECENT_WINDOW_DAYS: i64 = 30;
/// Weight of the all-time helpful rate in the unified score.
pub const OVERALL_WEIGHT: f64 = 0.7;
/// Weight of the recent helpful rate in the unified score.
pub const RECENT_WEIGHT: f64 = 0.3;
/// Maximum number of tags surfaced on a score.
pub const MAX_TOP_TAGS: usize = 6;

/// Compute the score of `place_id` from all of its feedback records.
#[must_use]
pub fn compute_place_score(
    place_id: &str,
    feedback: &[FeedbackRecord],
    now: DateTime<Utc>,
) -> PlaceScore {
    let total = count(feedback.iter());
    if total == 0 {
        return PlaceScore::empty(place_id, now);
    }

    let helpful = count(feedback.iter().filter(|f| f.is_helpful));
    let overall_rate = rate(helpful, total);

    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent: Vec<&FeedbackRecord> = feedback.iter().filter(|f| f.updated_at >= cutoff).collect();
    let recent_rate = if recent.is_empty() {
        overall_rate
    } else {
        rate(
            count(recent.iter().copied().filter(|f| f.is_helpful)),
            count(recent.iter().copied()),
        )
    };

    PlaceScore {
        place_id: place_id.to_string(),
        helpful_count: helpful,
        not_helpful_count: total - helpful,
        total_feedback: total,
        unified_score: unified_score(overall_rate, recent_rate),
        confidence_level: ConfidenceLevel::from_total(total),
        top_tags: top_tags(feedback, total),
        computed_at: now,
    }
}

/// `round(overall * 0.7 + recent * 0.3)`; both inputs are percentages.
///
/// Each product is rounded separately before the sum, so a blend that lands
/// on `.5` rounds up the same way on every platform.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops
)]
pub fn unified_score(overall_rate: f64, recent_rate: f64) -> u32 {
    let blended = overall_rate * OVERALL_WEIGHT + recent_rate * RECENT_WEIGHT;
    blended.round().clamp(0.0, 100.0) as u32
}

/// Minimum number of records that must mention a tag for it to surface:
/// `max(1, floor(total * 0.2))`.
#[must_use]
pub const fn tag_min_support(total: u32) -> u32 {
    let support = total / 5;
    if support == 0 { 1 } else { support }
}

fn top_tags(feedback: &[FeedbackRecord], total: u32) -> Vec<String> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for record in feedback {
        for tag in &record.tags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let min_support = tag_min_support(total);
    let mut kept: Vec<(&str, u32)> = counts
        .into_iter()
        .filter(|(_, n)| *n >= min_support)
        .collect();
    kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    kept.into_iter()
        .take(MAX_TOP_TAGS)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn rate(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        0.0
    } else {
        f64::from(part) / f64::from(whole) * 100.0
    }
}

#[allow(clippy::cast_possible_truncation)]
fn count<'a, I>(records: I) -> u32
where
    I: Iterator<Item = &'a FeedbackRecord>,
{
    records.count() as u32
}
