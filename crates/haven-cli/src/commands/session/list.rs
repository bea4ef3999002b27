use haven_core::entities::{SessionEvent, TimedSession};
use haven_core::enums::SessionState;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::change::announce_scan;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct SessionDetail {
    session: TimedSession,
    events: Vec<SessionEvent>,
}

pub async fn run(
    state: Option<&str>,
    limit: Option<u32>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let state = state
        .map(|value| parse_enum::<SessionState>(value, "state"))
        .transpose()?;
    let limit = effective_limit(limit, flags.limit, ctx.config.general.default_limit);

    // Nothing overdue may be listed as active.
    let report = ctx.service.scan_due(Some(ctx.owner())).await?;
    announce_scan(&report, ctx, flags.quiet);

    let sessions = ctx.service.list_sessions(ctx.owner(), state, limit).await?;
    output(&sessions, flags.format)
}

pub async fn get(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx.service.scan_due(Some(ctx.owner())).await?;
    announce_scan(&report, ctx, flags.quiet);

    let session = ctx.service.get_session(id).await?;
    let events = ctx.service.session_events(id).await?;
    output(&SessionDetail { session, events }, flags.format)
}
