use std::sync::Arc;
use std::time::Duration;

use haven_core::alarm::AlarmGuard;
use haven_core::entities::{SessionEvent, TimedSession};
use haven_core::enums::{SessionKind, SessionState};
use haven_db::feed::Change;
use haven_db::scanner::ScanLoop;
use serde::Serialize;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::alarm::TerminalBell;
use crate::cli::GlobalFlags;
use crate::commands::shared::change::{announce_scan, sender_for};
use crate::context::AppContext;
use crate::notify::{Notification, notifications_for};
use crate::output::output;

/// How often the watcher checks whether the scan loop has ended.
const POLL_EVERY: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct WatchEvent {
    event: SessionEvent,
    state: SessionState,
    notifications: Vec<Notification>,
}

pub async fn run(interval_secs: Option<u64>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let interval = match interval_secs {
        Some(0) => anyhow::bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => ctx.config.scanner.interval(),
    };

    let mut feed = ctx.service.subscribe();
    let active = ctx.service.active_sessions(ctx.owner()).await?;
    announce_scan(&active.report, ctx, flags.quiet);
    if active.sessions.is_empty() {
        if !flags.quiet {
            eprintln!("no active sessions to watch");
        }
        return Ok(());
    }

    let mut alarm = has_active_sos(&active.sessions).then(|| {
        let mut guard = AlarmGuard::new(Arc::new(TerminalBell::default()));
        guard.sound();
        guard
    });

    let scan_loop = ScanLoop::spawn(ctx.service.clone(), ctx.owner().to_string(), interval);
    tracing::info!(sessions = active.sessions.len(), ?interval, "watching active sessions");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut poll = tokio::time::interval(POLL_EVERY);

    loop {
        // Feed before poll: the scan loop publishes its last escalation right
        // before it finishes.
        tokio::select! {
            biased;
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                break;
            }
            change = feed.recv() => match change {
                Ok(Change::Session { event, session }) => {
                    output(&watch_event(event, &session, ctx), flags.format)?;
                }
                Ok(Change::Score(_)) => {}
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "watcher fell behind, some events were not shown"),
                Err(RecvError::Closed) => break,
            },
            _ = poll.tick() => {
                if scan_loop.is_finished() {
                    break;
                }
                if alarm.is_some() {
                    let sessions = ctx.service.list_sessions(ctx.owner(), Some(SessionState::Active), u32::MAX).await?;
                    if !has_active_sos(&sessions) {
                        alarm = None;
                    }
                }
            }
        }
    }

    scan_loop.stop().await;
    for pending in drain_pending(&mut feed, ctx) {
        output(&pending, flags.format)?;
    }
    if let Some(guard) = alarm {
        guard.silence();
    }
    Ok(())
}

fn watch_event(event: SessionEvent, session: &TimedSession, ctx: &AppContext) -> WatchEvent {
    let notifications = notifications_for(session, std::slice::from_ref(&event), sender_for(ctx, session));
    WatchEvent {
        event,
        state: session.state,
        notifications,
    }
}

/// Session changes already published but not yet shown.
fn drain_pending(feed: &mut Receiver<Change>, ctx: &AppContext) -> Vec<WatchEvent> {
    let mut pending = Vec::new();
    loop {
        match feed.try_recv() {
            Ok(Change::Session { event, session }) => pending.push(watch_event(event, &session, ctx)),
            Ok(Change::Score(_)) => {}
            Err(TryRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "watcher fell behind, some events were not shown");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    pending
}

fn has_active_sos(sessions: &[TimedSession]) -> bool {
    sessions
        .iter()
        .any(|s| s.is_active() && s.kind() == SessionKind::Sos)
}

#[cfg(test)]
mod tests {
    use haven_config::HavenConfig;
    use haven_core::entities::{NewSession, SessionPayload};
    use haven_core::enums::{EventKind, PlaceCategory};
    use haven_core::geo::Coordinates;
    use haven_db::repos::place::NewPlace;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn context(dir: &tempfile::TempDir) -> AppContext {
        let mut config = HavenConfig::default();
        config.database.path = dir.path().join("haven.db").to_string_lossy().into_owned();
        AppContext::init(config, Some("alex")).await.unwrap()
    }

    #[tokio::test]
    async fn escalation_published_before_exit_is_still_shown() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir).await;
        ctx.service.add_contact("alex", "Sam", "+15550100").await.unwrap();
        let recipients = ctx.service.resolve_recipients("alex", &[]).await.unwrap();
        let started = ctx
            .service
            .start_session(NewSession {
                owner_id: "alex".into(),
                recipients,
                deadline: Some(ctx.service.now() + chrono::Duration::hours(1)),
                initial_location: None,
                payload: SessionPayload::SafetyCheck { message: None },
            })
            .await
            .unwrap();

        let mut feed = ctx.service.subscribe();
        ctx.service.escalate_session(&started.session.id).await.unwrap();

        let pending = drain_pending(&mut feed, &ctx);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].event.kind, EventKind::Escalated);
        assert_eq!(pending[0].state, SessionState::Escalated);
        assert_eq!(pending[0].notifications.len(), 1);
        assert!(pending[0].notifications[0].sms_link.starts_with("sms:+15550100?body="));
        assert!(drain_pending(&mut feed, &ctx).is_empty());
    }

    #[tokio::test]
    async fn score_changes_are_skipped_when_draining() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir).await;
        let mut feed = ctx.service.subscribe();
        let place = ctx
            .service
            .add_place(
                "alex",
                NewPlace {
                    name: "Station 4".into(),
                    category: PlaceCategory::Police,
                    coordinates: Coordinates::new(40.0, -74.0),
                    phone: None,
                    address: None,
                },
            )
            .await
            .unwrap();
        ctx.service
            .submit_feedback(&place.id, "alex", true, &["well lit"])
            .await
            .unwrap();

        assert!(drain_pending(&mut feed, &ctx).is_empty());
    }
}
