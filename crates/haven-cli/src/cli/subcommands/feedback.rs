use clap::{Args, Subcommand};

/// Helpfulness feedback commands.
#[derive(Clone, Debug, Subcommand)]
pub enum FeedbackCommands {
    /// Rate a place. Submitting again replaces your earlier rating.
    Submit {
        /// Place ID (`plc-…` or `osm-…`).
        place_id: String,
        #[command(flatten)]
        verdict: Verdict,
        /// Short tag such as "well lit" (repeatable, at most 3).
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List all feedback on a place.
    List {
        /// Place ID.
        place_id: String,
    },
}

#[derive(Clone, Copy, Debug, Args)]
#[group(required = true, multiple = false)]
pub struct Verdict {
    /// The place helped.
    #[arg(long)]
    pub helpful: bool,
    /// The place did not help.
    #[arg(long)]
    pub not_helpful: bool,
}
