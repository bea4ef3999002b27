use chrono::{DateTime, Duration, Utc};
use haven_core::entities::{NewSession, SessionPayload};
use haven_core::enums::SessionKind;
use haven_core::geo::Coordinates;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SessionStartArgs;
use crate::commands::shared::change::SessionChangeResponse;
use crate::commands::shared::location::resolve_fix;
use crate::commands::shared::parse::parse_timestamp;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: &SessionStartArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let kind = SessionKind::from(args.kind);
    let deadline = deadline_from(args, ctx.service.now())?;
    if kind == SessionKind::SafetyCheck && deadline.is_none() {
        anyhow::bail!("a safety check needs a deadline: pass --in <minutes> or --deadline <time>");
    }
    let payload = payload_from(args, kind)?;

    let recipients = ctx
        .service
        .resolve_recipients(ctx.owner(), &args.contacts)
        .await?;

    // A safety check only records a position when one is given explicitly.
    let wants_location = kind != SessionKind::SafetyCheck || args.location.lat.is_some();
    let initial_location = if wants_location {
        resolve_fix(&args.location, ctx, false).await?
    } else {
        None
    };

    let change = ctx
        .service
        .start_session(NewSession {
            owner_id: ctx.owner().to_string(),
            recipients,
            deadline,
            initial_location,
            payload,
        })
        .await?;
    tracing::info!(session = %change.session.id, %kind, "session started");
    output(&SessionChangeResponse::new(change, ctx), flags.format)
}

fn deadline_from(args: &SessionStartArgs, now: DateTime<Utc>) -> anyhow::Result<Option<DateTime<Utc>>> {
    match (args.minutes, args.deadline.as_deref()) {
        (Some(minutes), _) if minutes <= 0 => {
            anyhow::bail!("--in must be a positive number of minutes, got {minutes}")
        }
        (Some(minutes), _) => Ok(Some(now + Duration::minutes(minutes))),
        (None, Some(raw)) => parse_timestamp(raw, "deadline").map(Some),
        (None, None) => Ok(None),
    }
}

fn payload_from(args: &SessionStartArgs, kind: SessionKind) -> anyhow::Result<SessionPayload> {
    let only_for = |flag: &str, wanted: SessionKind| {
        anyhow::anyhow!("{flag} only applies to {wanted} sessions, not {kind}")
    };
    if args.message.is_some() && kind != SessionKind::SafetyCheck {
        return Err(only_for("--message", SessionKind::SafetyCheck));
    }
    if args.battery.is_some() && kind != SessionKind::Sos {
        return Err(only_for("--battery", SessionKind::Sos));
    }
    if args.dest_lat.is_some() && kind != SessionKind::LocationShare {
        return Err(only_for("--dest-lat/--dest-lng", SessionKind::LocationShare));
    }

    Ok(match kind {
        SessionKind::SafetyCheck => SessionPayload::SafetyCheck {
            message: args
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
        },
        SessionKind::Sos => SessionPayload::Sos {
            battery_level: args.battery,
        },
        SessionKind::LocationShare => SessionPayload::LocationShare {
            destination: args
                .dest_lat
                .zip(args.dest_lng)
                .map(|(lat, lng)| Coordinates::new(lat, lng)),
        },
    })
}
