//! Shared test utilities for haven-db unit tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use haven_core::clock::ManualClock;

use crate::HavenDb;
use crate::service::HavenService;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 21, 0, 0).unwrap()
}

/// In-memory service whose clock starts at [`t0`] and only moves when told.
pub async fn test_service() -> (HavenService, Arc<ManualClock>) {
    let db = HavenDb::open_local(":memory:").await.unwrap();
    let clock = Arc::new(ManualClock::new(t0()));
    (HavenService::from_db(db, clock.clone()), clock)
}
