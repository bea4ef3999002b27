use clap::{Subcommand, ValueEnum};
use haven_core::enums::PlaceCategory;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PlaceCategoryArg {
    Police,
    Hospital,
    SafeSpace,
}

impl From<PlaceCategoryArg> for PlaceCategory {
    fn from(value: PlaceCategoryArg) -> Self {
        match value {
            PlaceCategoryArg::Police => Self::Police,
            PlaceCategoryArg::Hospital => Self::Hospital,
            PlaceCategoryArg::SafeSpace => Self::SafeSpace,
        }
    }
}

/// Safe place commands.
#[derive(Clone, Debug, Subcommand)]
pub enum PlaceCommands {
    /// Contribute a safe place.
    Add {
        /// Place name.
        name: String,
        #[arg(long, value_enum, default_value = "safe-space")]
        category: PlaceCategoryArg,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// List contributed places, newest first.
    List {
        #[arg(long, value_enum)]
        category: Option<PlaceCategoryArg>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Contributed places near a point, nearest first.
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in meters.
        #[arg(long, default_value_t = 2_000.0)]
        radius: f64,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Police stations and hospitals near a point, from OpenStreetMap.
    Search {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Search radius in meters (defaults to `geodata.search_radius_m`).
        #[arg(long)]
        radius: Option<f64>,
        /// Categories to search (repeatable; defaults to police and hospital).
        #[arg(long, value_enum)]
        category: Vec<PlaceCategoryArg>,
        #[arg(long)]
        limit: Option<u32>,
    },
}
