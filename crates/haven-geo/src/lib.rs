//! # haven-geo
//!
//! Geodata lookup and device location for Haven.
//!
//! - [`OverpassClient`] queries the public Overpass API for police stations
//!   and hospitals around a point, falling back across mirror endpoints.
//! - [`location`] defines the [`LocationProvider`] seam and the bounded
//!   [`acquire_fix`] wait used before starting an SOS or a location share.

pub mod location;
pub mod overpass;

mod error;
mod http;

pub use error::GeoError;
pub use location::{FallbackProvider, LocationProvider, NoProvider, StaticProvider, acquire_fix};
pub use overpass::OverpassClient;
