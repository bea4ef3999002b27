//! Service layer tying the store to a clock and the change feed.
//!
//! `HavenService` wraps `HavenDb` (raw database access), an injectable
//! [`Clock`] and the [`ChangeFeed`]. All repo methods are implemented as
//! `impl HavenService` blocks under [`crate::repos`].
//!
//! Every mutation follows this protocol:
//! 1. Load current state and apply the pure domain transition
//! 2. Begin transaction
//! 3. Write the entity row (compare-and-set on state where it matters)
//! 4. Append event rows inside the same transaction
//! 5. Commit, then publish to the change feed

use std::sync::Arc;

use chrono::{DateTime, Utc};
use haven_core::clock::{Clock, SystemClock};

use crate::HavenDb;
use crate::error::DatabaseError;
use crate::feed::{Change, ChangeFeed};

/// Shared handle to the store. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct HavenService {
    db: Arc<HavenDb>,
    clock: Arc<dyn Clock>,
    feed: ChangeFeed,
}

impl HavenService {
    /// Open a local database and wrap it with the system clock.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = HavenDb::open_local(db_path).await?;
        Ok(Self::from_db(db, Arc::new(SystemClock)))
    }

    /// Create from an existing `HavenDb` and clock (tests pass a manual clock).
    #[must_use]
    pub fn from_db(db: HavenDb, clock: Arc<dyn Clock>) -> Self {
        Self {
            db: Arc::new(db),
            clock,
            feed: ChangeFeed::default(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub fn db(&self) -> &HavenDb {
        &self.db
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    #[must_use]
    pub const fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Subscribe to changes committed after this call.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Change> {
        self.feed.subscribe()
    }

    pub(crate) fn publish(&self, change: Change) {
        let delivered = self.feed.publish(change);
        tracing::trace!(delivered, "change published");
    }
}

impl std::fmt::Debug for HavenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HavenService")
            .field("clock", &self.clock)
            .field("observers", &self.feed.observer_count())
            .finish_non_exhaustive()
    }
}
