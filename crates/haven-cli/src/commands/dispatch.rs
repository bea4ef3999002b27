use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Contact { action } => commands::contact::handle(&action, ctx, flags).await,
        Commands::Session { action } => commands::session::handle(&action, ctx, flags).await,
        Commands::Scan(args) => commands::scan::handle(&args, ctx, flags).await,
        Commands::Place { action } => commands::place::handle(&action, ctx, flags).await,
        Commands::Feedback { action } => commands::feedback::handle(&action, ctx, flags).await,
        Commands::Score(args) => commands::score::handle(&args, ctx, flags).await,
        Commands::Events(args) => commands::events::handle(&args, ctx, flags).await,
    }
}
