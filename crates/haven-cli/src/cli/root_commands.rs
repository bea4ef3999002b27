use clap::{Args, Subcommand};

use crate::cli::subcommands::{ContactCommands, FeedbackCommands, PlaceCommands, SessionCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Trusted contacts who receive your alerts.
    Contact {
        #[command(subcommand)]
        action: ContactCommands,
    },
    /// Safety checks, SOS alerts and location shares.
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },
    /// Escalate every active session whose deadline has passed.
    Scan(ScanArgs),
    /// Safe places.
    Place {
        #[command(subcommand)]
        action: PlaceCommands,
    },
    /// Helpfulness feedback on places.
    Feedback {
        #[command(subcommand)]
        action: FeedbackCommands,
    },
    /// Show the community helpfulness score of a place.
    Score(ScoreArgs),
    /// Show the session event log.
    Events(EventsArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ScanArgs {
    /// Scan every owner's sessions, not just yours.
    #[arg(long)]
    pub all: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ScoreArgs {
    /// Place ID (`plc-…` or `osm-…`).
    pub place_id: String,
}

#[derive(Clone, Debug, Args)]
pub struct EventsArgs {
    /// Only events of this session.
    #[arg(long)]
    pub session: Option<String>,
    /// Only events of this kind (e.g. escalated, moved-significantly).
    #[arg(long)]
    pub kind: Option<String>,
    /// Maximum number of events.
    #[arg(long)]
    pub limit: Option<u32>,
}
