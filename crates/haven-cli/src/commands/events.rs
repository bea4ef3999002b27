use haven_core::enums::EventKind;
use haven_db::repos::event::EventFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::EventsArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `haven events`.
pub async fn handle(args: &EventsArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let kind = args
        .kind
        .as_deref()
        .map(|raw| parse_enum::<EventKind>(raw, "event kind"))
        .transpose()?;
    let filter = EventFilter {
        session_id: args.session.clone(),
        kind,
        limit: Some(effective_limit(
            args.limit,
            flags.limit,
            ctx.config.general.default_limit,
        )),
    };
    let events = ctx.service.list_events(&filter).await?;
    output(&events, flags.format)
}
