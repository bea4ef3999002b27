//! Place feedback and derived scores.
//!
//! A feedback write and the recomputation of the place's score happen in one
//! transaction: the score row always reflects the complete feedback set.

use haven_core::entities::{FeedbackRecord, PlaceScore};
use haven_core::errors::CoreError;
use haven_core::scoring::compute_place_score;

use crate::error::DatabaseError;
use crate::feed::Change;
use crate::helpers::{get_count, parse_datetime, parse_enum, parse_json, to_json};
use crate::service::HavenService;

const FEEDBACK_COLUMNS: &str = "place_id, user_id, is_helpful, tags, submitted_at, updated_at";

impl HavenService {
    /// Record `user_id`'s opinion of `place_id` and return the new score.
    ///
    /// A repeat submission by the same user overwrites the earlier one,
    /// keeping its `submitted_at`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` (wrapped) for blank ids or more than
    /// three distinct tags, and `DatabaseError` if the write fails.
    pub async fn submit_feedback<S: AsRef<str> + Sync>(
        &self,
        place_id: &str,
        user_id: &str,
        is_helpful: bool,
        tags: &[S],
    ) -> Result<PlaceScore, DatabaseError> {
        if place_id.trim().is_empty() || user_id.trim().is_empty() {
            return Err(CoreError::Validation("place and user are required for feedback".into()).into());
        }
        let tags = FeedbackRecord::normalize_tags(tags)?;
        let now = self.now();

        let tx = self.db().begin().await?;
        let result: Result<PlaceScore, DatabaseError> = async {
            tx.execute(
                "INSERT INTO place_feedback (place_id, user_id, is_helpful, tags, submitted_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT (place_id, user_id) DO UPDATE SET
                     is_helpful = excluded.is_helpful,
                     tags = excluded.tags,
                     updated_at = excluded.updated_at",
                libsql::params![
                    place_id,
                    user_id,
                    i64::from(is_helpful),
                    to_json(&tags)?,
                    now.to_rfc3339()
                ],
            )
            .await?;

            let feedback = load_feedback(&tx, place_id).await?;
            let score = compute_place_score(place_id, &feedback, now);
            store_score(&tx, &score).await?;
            Ok(score)
        }
        .await;
        let score = tx.finish(result).await?;

        tracing::debug!(
            place = place_id,
            score = score.unified_score,
            total = score.total_feedback,
            "place score recomputed"
        );
        self.publish(Change::Score(score.clone()));
        Ok(score)
    }

    /// All feedback for a place, oldest submission first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_feedback(&self, place_id: &str) -> Result<Vec<FeedbackRecord>, DatabaseError> {
        load_feedback(self.db().conn(), place_id).await
    }

    /// The stored score of a place, or the all-zero score if nobody has rated it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_place_score(&self, place_id: &str) -> Result<PlaceScore, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT place_id, helpful_count, not_helpful_count, total_feedback, unified_score,
                        confidence_level, top_tags, computed_at
                 FROM place_scores WHERE place_id = ?1",
                [place_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_score(&row),
            None => Ok(PlaceScore::empty(place_id, self.now())),
        }
    }
}

async fn load_feedback(
    conn: &libsql::Connection,
    place_id: &str,
) -> Result<Vec<FeedbackRecord>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!(
                "SELECT {FEEDBACK_COLUMNS} FROM place_feedback WHERE place_id = ?1
                 ORDER BY submitted_at ASC, user_id ASC"
            ),
            [place_id],
        )
        .await?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        records.push(row_to_feedback(&row)?);
    }
    Ok(records)
}

async fn store_score(conn: &libsql::Connection, score: &PlaceScore) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO place_scores (place_id, helpful_count, not_helpful_count, total_feedback,
                                   unified_score, confidence_level, top_tags, computed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT (place_id) DO UPDATE SET
             helpful_count = excluded.helpful_count,
             not_helpful_count = excluded.not_helpful_count,
             total_feedback = excluded.total_feedback,
             unified_score = excluded.unified_score,
             confidence_level = excluded.confidence_level,
             top_tags = excluded.top_tags,
             computed_at = excluded.computed_at",
        libsql::params![
            score.place_id.as_str(),
            i64::from(score.helpful_count),
            i64::from(score.not_helpful_count),
            i64::from(score.total_feedback),
            i64::from(score.unified_score),
            score.confidence_level.as_str(),
            to_json(&score.top_tags)?,
            score.computed_at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

fn row_to_feedback(row: &libsql::Row) -> Result<FeedbackRecord, DatabaseError> {
    Ok(FeedbackRecord {
        place_id: row.get(0)?,
        user_id: row.get(1)?,
        is_helpful: row.get::<i64>(2)? != 0,
        tags: parse_json(&row.get::<String>(3)?)?,
        submitted_at: parse_datetime(&row.get::<String>(4)?)?,
        updated_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

fn row_to_score(row: &libsql::Row) -> Result<PlaceScore, DatabaseError> {
    Ok(PlaceScore {
        place_id: row.get(0)?,
        helpful_count: get_count(row, 1)?,
        not_helpful_count: get_count(row, 2)?,
        total_feedback: get_count(row, 3)?,
        unified_score: get_count(row, 4)?,
        confidence_level: parse_enum(&row.get::<String>(5)?)?,
        top_tags: parse_json(&row.get::<String>(6)?)?,
        computed_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use haven_core::enums::ConfidenceLevel;
    use pretty_assertions::assert_eq;

    use crate::feed::Change;
    use crate::test_support::{t0, test_service};

    const NO_TAGS: &[&str] = &[];

    #[tokio::test]
    async fn unrated_place_has_zero_score() {
        let (svc, _clock) = test_service().await;
        let score = svc.get_place_score("osm-node-1").await.unwrap();
        assert_eq!(score.total_feedback, 0);
        assert_eq!(score.unified_score, 0);
        assert_eq!(score.confidence_level, ConfidenceLevel::Low);
    }

    #[tokio::test]
    async fn first_helpful_vote_scores_100_low_confidence() {
        let (svc, _clock) = test_service().await;
        let score = svc
            .submit_feedback("osm-node-1", "alex", true, &["open 24h"])
            .await
            .unwrap();
        assert_eq!(score.unified_score, 100);
        assert_eq!(score.confidence_level, ConfidenceLevel::Low);
        assert_eq!(score.top_tags, vec!["open 24h".to_string()]);
        assert_eq!(svc.get_place_score("osm-node-1").await.unwrap(), score);
    }

    #[tokio::test]
    async fn resubmission_overwrites_and_keeps_submitted_at() {
        let (svc, clock) = test_service().await;
        svc.submit_feedback("plc-1", "alex", true, NO_TAGS).await.unwrap();
        clock.advance(Duration::days(2));
        let score = svc.submit_feedback("plc-1", "alex", false, &["closed"]).await.unwrap();

        assert_eq!(score.total_feedback, 1);
        assert_eq!(score.helpful_count, 0);
        assert_eq!(score.unified_score, 0);

        let records = svc.list_feedback("plc-1").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].submitted_at, t0());
        assert_eq!(records[0].updated_at, t0() + Duration::days(2));
        assert_eq!(records[0].tags, vec!["closed".to_string()]);
    }

    #[tokio::test]
    async fn ten_votes_reach_high_confidence() {
        let (svc, _clock) = test_service().await;
        let mut score = None;
        for i in 0..10 {
            score = Some(
                svc.submit_feedback("plc-1", &format!("user-{i}"), true, NO_TAGS)
                    .await
                    .unwrap(),
            );
        }
        let score = score.unwrap();
        assert_eq!(score.unified_score, 100);
        assert_eq!(score.confidence_level, ConfidenceLevel::High);
    }

    #[tokio::test]
    async fn too_many_tags_write_nothing() {
        let (svc, _clock) = test_service().await;
        let err = svc
            .submit_feedback("plc-1", "alex", true, &["a", "b", "c", "d"])
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(svc.list_feedback("plc-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn score_changes_are_published() {
        let (svc, _clock) = test_service().await;
        let mut changes = svc.subscribe();
        let score = svc.submit_feedback("plc-1", "alex", true, NO_TAGS).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), Change::Score(score));
    }
}
