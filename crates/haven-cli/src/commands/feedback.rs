use crate::cli::GlobalFlags;
use crate::cli::subcommands::FeedbackCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `haven feedback`.
pub async fn handle(
    action: &FeedbackCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        FeedbackCommands::Submit {
            place_id,
            verdict,
            tags,
        } => {
            let score = ctx
                .service
                .submit_feedback(place_id, ctx.owner(), verdict.helpful, tags)
                .await?;
            output(&score, flags.format)
        }
        FeedbackCommands::List { place_id } => {
            let feedback = ctx.service.list_feedback(place_id).await?;
            output(&feedback, flags.format)
        }
    }
}
