//! In-process change feed.
//!
//! Every persisted session event and every recomputed place score is
//! published on a broadcast channel. Publishing never blocks: observers that
//! fall behind lose the oldest messages and see `RecvError::Lagged`.

use haven_core::entities::{PlaceScore, SessionEvent, TimedSession};
use tokio::sync::broadcast;

/// Default number of buffered changes per observer.
pub const DEFAULT_CAPACITY: usize = 256;

/// A committed change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A session event, with the session as it was right after the event.
    Session {
        event: SessionEvent,
        session: Box<TimedSession>,
    },
    /// A place score after a feedback write.
    Score(PlaceScore),
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Change>,
}

impl ChangeFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.tx.subscribe()
    }

    /// Publish a change; returns how many observers received it.
    pub fn publish(&self, change: Change) -> usize {
        self.tx.send(change).unwrap_or(0)
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
