use clap::Args;

/// A position given on the command line.
#[derive(Clone, Debug, Default, Args)]
pub struct LocationArgs {
    /// Latitude in decimal degrees.
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude in decimal degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
    /// Accuracy of the position in meters.
    #[arg(long, default_value_t = 10.0)]
    pub accuracy: f64,
}
