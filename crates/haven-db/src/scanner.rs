//! Deadline expiry scanning.
//!
//! [`scan`] escalates every active session whose deadline has passed. It is
//! idempotent and safe to run from several places at once: the escalation
//! write is a compare-and-set, so a session already moved on by someone else
//! is skipped rather than escalated twice. A failed write is logged and
//! recorded, and the scan carries on with the next session.
//!
//! [`ScanLoop`] runs the scan on a fixed interval while the owner has any
//! active session, and stops itself once none remain.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use haven_core::entities::TimedSession;
use haven_core::enums::EventKind;
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::DatabaseError;
use crate::repos::session::{Outcome, SessionChange};
use crate::service::HavenService;

/// Where the scanner writes escalations.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Escalate `session` if its stored row is still active with the same
    /// deadline. `Ok(None)` means another writer got there first.
    async fn escalate_if_active(
        &self,
        session: &TimedSession,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionChange>, DatabaseError>;
}

/// A session the scanner could not escalate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub session_id: String,
    pub error: String,
}

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Sessions escalated by this scan, in scan order.
    pub escalated: Vec<String>,
    pub failures: Vec<ScanFailure>,
    /// The committed escalations, for notification dispatch.
    pub changes: Vec<SessionChange>,
}

impl ScanReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.escalated.is_empty() && self.failures.is_empty()
    }
}

/// Escalate every session in `sessions` that is active with `deadline <= now`.
pub async fn scan<S>(store: &S, sessions: &[TimedSession], now: DateTime<Utc>) -> ScanReport
where
    S: SessionStore + ?Sized,
{
    let mut report = ScanReport::default();
    for session in sessions.iter().filter(|s| s.is_expired(now)) {
        match store.escalate_if_active(session, now).await {
            Ok(Some(change)) => {
                tracing::info!(
                    session = %session.id,
                    kind = %session.kind(),
                    deadline = ?session.deadline,
                    "deadline passed, session escalated"
                );
                report.escalated.push(session.id.clone());
                report.changes.push(change);
            }
            Ok(None) => {
                tracing::debug!(session = %session.id, "already transitioned, skipping");
            }
            Err(error) => {
                tracing::warn!(session = %session.id, %error, "escalation failed");
                report.failures.push(ScanFailure {
                    session_id: session.id.clone(),
                    error: error.to_string(),
                });
            }
        }
    }
    report
}

#[async_trait]
impl SessionStore for HavenService {
    async fn escalate_if_active(
        &self,
        session: &TimedSession,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionChange>, DatabaseError> {
        let mut escalated = session.clone();
        if escalated.escalate(now).is_err() {
            return Ok(None);
        }
        let detail = json!({ "trigger": "deadline", "deadline": session.deadline });
        let change = self
            .persist(
                &escalated,
                session.deadline,
                Outcome::single(EventKind::Escalated, Some(detail)),
                now,
            )
            .await?;
        if let Some(change) = &change {
            self.publish_session_change(change);
        }
        Ok(change)
    }
}

/// Active sessions after an opportunistic scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSessions {
    pub sessions: Vec<TimedSession>,
    pub report: ScanReport,
}

impl HavenService {
    /// Scan the active sessions of `owner_id`, or of everyone when `None`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` only if loading the sessions fails; per-session
    /// write failures are in the report.
    pub async fn scan_due(&self, owner_id: Option<&str>) -> Result<ScanReport, DatabaseError> {
        let sessions = self.load_active(owner_id).await?;
        Ok(scan(self, &sessions, self.now()).await)
    }

    /// The owner's active sessions, scanning for passed deadlines first so
    /// that nothing overdue is reported as active.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if loading the sessions fails.
    pub async fn active_sessions(&self, owner_id: &str) -> Result<ActiveSessions, DatabaseError> {
        let before = self.load_active(Some(owner_id)).await?;
        let report = scan(self, &before, self.now()).await;
        let sessions = if report.escalated.is_empty() {
            before
        } else {
            self.load_active(Some(owner_id)).await?
        };
        Ok(ActiveSessions { sessions, report })
    }
}

/// Background task that scans one owner's sessions on a fixed interval.
pub struct ScanLoop {
    handle: JoinHandle<()>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ScanLoop {
    /// Spawn the loop. The first scan runs immediately.
    #[must_use]
    pub fn spawn(service: HavenService, owner_id: String, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_loop(service, owner_id, interval, shutdown_rx));
        Self {
            handle,
            shutdown: Some(shutdown_tx),
        }
    }

    /// True once the loop has exited on its own or after [`Self::stop`].
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the loop to stop and wait for it.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.join().await;
    }

    /// Wait for the loop to stop by itself.
    pub async fn join(self) {
        if let Err(error) = self.handle.await {
            tracing::warn!(%error, "scan loop task failed");
        }
    }
}

async fn run_loop(
    service: HavenService,
    owner_id: String,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::debug!(owner = %owner_id, ?interval, "scan loop started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::debug!(owner = %owner_id, "scan loop stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        match service.active_sessions(&owner_id).await {
            Ok(active) if active.sessions.is_empty() => {
                tracing::debug!(owner = %owner_id, "no active sessions left, scan loop exiting");
                return;
            }
            Ok(_) => {}
            Err(error) => tracing::warn!(owner = %owner_id, %error, "scan failed"),
        }
    }
}
