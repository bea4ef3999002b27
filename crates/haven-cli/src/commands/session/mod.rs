mod list;
mod locate;
mod start;
mod transition;
mod watch;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SessionCommands;
use crate::context::AppContext;

/// Handle `haven session`.
pub async fn handle(
    action: &SessionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SessionCommands::Start(args) => start::run(args, ctx, flags).await,
        SessionCommands::Get { id } => list::get(id, ctx, flags).await,
        SessionCommands::List { state, limit } => {
            list::run(state.as_deref(), *limit, ctx, flags).await
        }
        SessionCommands::Resolve { id } => {
            transition::run(transition::Transition::Resolve, id, ctx, flags).await
        }
        SessionCommands::Cancel { id } => {
            transition::run(transition::Transition::Cancel, id, ctx, flags).await
        }
        SessionCommands::Alert { id } => {
            transition::run(transition::Transition::Alert, id, ctx, flags).await
        }
        SessionCommands::Extend { id, minutes } => {
            transition::run(transition::Transition::Extend(*minutes), id, ctx, flags).await
        }
        SessionCommands::Locate {
            id,
            location,
            battery,
        } => locate::run(id, location, *battery, ctx, flags).await,
        SessionCommands::Watch { interval } => watch::run(*interval, ctx, flags).await,
    }
}
