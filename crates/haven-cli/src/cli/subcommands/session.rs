use clap::{Args, Subcommand, ValueEnum};
use haven_core::enums::SessionKind;

use super::LocationArgs;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SessionKindArg {
    SafetyCheck,
    Sos,
    LocationShare,
}

impl From<SessionKindArg> for SessionKind {
    fn from(value: SessionKindArg) -> Self {
        match value {
            SessionKindArg::SafetyCheck => Self::SafetyCheck,
            SessionKindArg::Sos => Self::Sos,
            SessionKindArg::LocationShare => Self::LocationShare,
        }
    }
}

/// Session lifecycle commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SessionCommands {
    /// Start a safety check, SOS alert or location share.
    Start(SessionStartArgs),
    /// Show one session.
    Get {
        /// Session ID.
        id: String,
    },
    /// List your sessions, newest first.
    List {
        /// Optional state filter (active, resolved-safe, cancelled, escalated).
        #[arg(long)]
        state: Option<String>,
        /// Maximum number of sessions.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Check in as safe.
    Resolve {
        /// Session ID.
        id: String,
    },
    /// Cancel a session started by mistake.
    Cancel {
        /// Session ID.
        id: String,
    },
    /// Alert your contacts now without waiting for the deadline.
    Alert {
        /// Session ID.
        id: String,
    },
    /// Push the deadline back.
    Extend {
        /// Session ID.
        id: String,
        /// Minutes to add.
        #[arg(long = "by", value_name = "MINUTES")]
        minutes: i64,
    },
    /// Record your current position on an active session.
    Locate {
        /// Session ID.
        id: String,
        #[command(flatten)]
        location: LocationArgs,
        /// Device battery level in percent (SOS only).
        #[arg(long)]
        battery: Option<u8>,
    },
    /// Stay in the foreground: escalate on deadline, ring the SOS alarm, print notifications.
    Watch {
        /// Seconds between deadline scans (defaults to `scanner.interval_secs`).
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Clone, Debug, Args)]
pub struct SessionStartArgs {
    /// What kind of session to start.
    #[arg(value_enum)]
    pub kind: SessionKindArg,

    /// Deadline in minutes from now.
    #[arg(long = "in", value_name = "MINUTES", conflicts_with = "deadline")]
    pub minutes: Option<i64>,

    /// Absolute deadline (RFC 3339).
    #[arg(long)]
    pub deadline: Option<String>,

    /// Contact IDs to alert (repeatable; defaults to all trusted contacts).
    #[arg(long = "contact", value_name = "ID")]
    pub contacts: Vec<String>,

    /// Note for a safety check, e.g. where you are going.
    #[arg(long)]
    pub message: Option<String>,

    /// Device battery level in percent (SOS only).
    #[arg(long)]
    pub battery: Option<u8>,

    /// Destination latitude (location share only).
    #[arg(long, requires = "dest_lng", allow_negative_numbers = true)]
    pub dest_lat: Option<f64>,

    /// Destination longitude (location share only).
    #[arg(long, requires = "dest_lat", allow_negative_numbers = true)]
    pub dest_lng: Option<f64>,

    #[command(flatten)]
    pub location: LocationArgs,
}
