use crate::cli::GlobalFlags;
use crate::cli::subcommands::LocationArgs;
use crate::commands::shared::change::SessionChangeResponse;
use crate::commands::shared::location::resolve_fix;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    location: &LocationArgs,
    battery: Option<u8>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let Some(fix) = resolve_fix(location, ctx, true).await? else {
        anyhow::bail!("no location fix available");
    };

    // Battery first so that a movement alert carries the fresh level.
    if let Some(level) = battery {
        ctx.service.set_session_battery(id, level).await?;
    }
    let change = ctx.service.update_session_location(id, fix).await?;
    if change.location.is_some_and(|update| update.moved_significantly_now) {
        tracing::info!(session = %id, "moved significantly from the starting point");
    }
    output(&SessionChangeResponse::new(change, ctx), flags.format)
}
