use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ContactCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct RemovedResponse<'a> {
    removed: &'a str,
}

/// Handle `haven contact`.
pub async fn handle(
    action: &ContactCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ContactCommands::Add { name, phone } => {
            let contact = ctx.service.add_contact(ctx.owner(), name, phone).await?;
            output(&contact, flags.format)
        }
        ContactCommands::List => {
            let contacts = ctx.service.list_contacts(ctx.owner()).await?;
            output(&contacts, flags.format)
        }
        ContactCommands::Remove { id } => {
            ctx.service.remove_contact(ctx.owner(), id).await?;
            output(&RemovedResponse { removed: id }, flags.format)
        }
    }
}
