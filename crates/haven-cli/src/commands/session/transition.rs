use chrono::Duration;

use crate::cli::GlobalFlags;
use crate::commands::shared::change::SessionChangeResponse;
use crate::context::AppContext;
use crate::output::output;

#[derive(Clone, Copy, Debug)]
pub enum Transition {
    Resolve,
    Cancel,
    Alert,
    /// Minutes to add to the deadline.
    Extend(i64),
}

pub async fn run(
    transition: Transition,
    id: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let change = match transition {
        Transition::Resolve => ctx.service.resolve_session(id).await?,
        Transition::Cancel => ctx.service.cancel_session(id).await?,
        Transition::Alert => ctx.service.escalate_session(id).await?,
        Transition::Extend(minutes) => {
            ctx.service
                .extend_session(id, Duration::minutes(minutes))
                .await?
        }
    };
    tracing::info!(session = %id, state = %change.session.state, "session updated");
    output(&SessionChangeResponse::new(change, ctx), flags.format)
}
