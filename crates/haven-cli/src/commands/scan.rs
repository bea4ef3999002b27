use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ScanArgs;
use crate::commands::shared::change::sender_for;
use crate::context::AppContext;
use crate::notify::{Notification, notifications_for};
use crate::output::output;

#[derive(Debug, Serialize)]
struct ScanFailureResponse {
    session_id: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    escalated: Vec<String>,
    failures: Vec<ScanFailureResponse>,
    notifications: Vec<Notification>,
}

/// Handle `haven scan`.
pub async fn handle(args: &ScanArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let owner = (!args.all).then(|| ctx.owner());
    let report = ctx.service.scan_due(owner).await?;

    let notifications = report
        .changes
        .iter()
        .flat_map(|change| {
            notifications_for(&change.session, &change.events, sender_for(ctx, &change.session))
        })
        .collect();

    output(
        &ScanResponse {
            escalated: report.escalated,
            failures: report
                .failures
                .into_iter()
                .map(|f| ScanFailureResponse {
                    session_id: f.session_id,
                    error: f.error,
                })
                .collect(),
            notifications,
        },
        flags.format,
    )
}
