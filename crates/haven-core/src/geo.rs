//! Great-circle distance, location fixes and bounding boxes.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Distance from the initial location beyond which an SOS session counts as
/// having moved significantly.
pub const MOVED_SIGNIFICANTLY_METERS: f64 = 500.0;

/// Approximate length of one degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance between two points in meters (haversine formula).
#[must_use]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_meters(self.lat, self.lng, other.lat, other.lng)
    }

    /// Link that opens the point in a browser map.
    #[must_use]
    pub fn maps_url(&self) -> String {
        format!("https://maps.google.com/?q={:.6},{:.6}", self.lat, self.lng)
    }
}

/// A single reading from the device geolocation service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LocationFix {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_meters: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationFix {
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }

    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_meters(self.lat, self.lng, other.lat, other.lng)
    }
}

/// An axis-aligned lat/lng rectangle, in the `(south, west, north, east)`
/// order geodata queries expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Box that contains the circle of `radius_m` around `center`.
    #[must_use]
    pub fn around(center: Coordinates, radius_m: f64) -> Self {
        let d_lat = radius_m / METERS_PER_DEGREE;
        // Near the poles the longitude span degenerates; cap it at the full range.
        let cos_lat = center.lat.to_radians().cos().abs().max(1e-6);
        let d_lng = (radius_m / (METERS_PER_DEGREE * cos_lat)).min(180.0);

        Self {
            south: (center.lat - d_lat).max(-90.0),
            west: (center.lng - d_lng).max(-180.0),
            north: (center.lat + d_lat).min(90.0),
            east: (center.lng + d_lng).min(180.0),
        }
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.south..=self.north).contains(&point.lat)
            && (self.west..=self.east).contains(&point.lng)
    }
}

/// Pair every item with its distance from `origin` and sort nearest first.
pub fn sort_by_distance<T, F>(items: Vec<T>, origin: &Coordinates, coords: F) -> Vec<(T, f64)>
where
    F: Fn(&T) -> Coordinates,
{
    let mut with_distance: Vec<(T, f64)> = items
        .into_iter()
        .map(|item| {
            let distance = origin.distance_to(&coords(&item));
            (item, distance)
        })
        .collect();
    with_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
    with_distance
}

/// Like [`sort_by_distance`] but drops everything farther than `radius_m`.
pub fn within_radius<T, F>(
    items: Vec<T>,
    origin: &Coordinates,
    radius_m: f64,
    coords: F,
) -> Vec<(T, f64)>
where
    F: Fn(&T) -> Coordinates,
{
    let mut sorted = sort_by_distance(items, origin, coords);
    sorted.retain(|(_, distance)| *distance <= radius_m);
    sorted
}
