use crate::cli::GlobalFlags;
use crate::cli::root_commands::ScoreArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `haven score`.
pub async fn handle(args: &ScoreArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let score = ctx.service.get_place_score(&args.place_id).await?;
    output(&score, flags.format)
}
