//! Overpass API client for safe places.
//!
//! Police stations and hospitals are OpenStreetMap `amenity` nodes or ways.
//! Ways carry no coordinates of their own, so queries ask for `out center`
//! and the element's center point is used.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use haven_core::entities::Place;
use haven_core::enums::PlaceCategory;
use haven_core::geo::{self, BoundingBox, Coordinates};
use haven_core::ids::osm_place_id;
use serde::Deserialize;

use crate::error::GeoError;
use crate::http::check_response;

/// Mirrors tried in order when the client is built without explicit endpoints.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
];

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for the Overpass interpreter.
pub struct OverpassClient {
    http: reqwest::Client,
    endpoints: Vec<String>,
    timeout: Duration,
}

impl Default for OverpassClient {
    fn default() -> Self {
        Self::new(
            DEFAULT_ENDPOINTS.iter().map(ToString::to_string).collect(),
            Duration::from_secs(25),
        )
    }
}

impl OverpassClient {
    /// Create a client that tries `endpoints` in order, each bounded by `timeout`.
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    #[must_use]
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Self {
        let endpoints = endpoints
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            http: reqwest::Client::builder()
                .user_agent("haven/0.1")
                .timeout(timeout)
                .build()
                .expect("reqwest client should build"),
            endpoints,
            timeout,
        }
    }

    #[must_use]
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Fetch every police station and hospital inside `bbox`.
    ///
    /// Categories without an OpenStreetMap amenity (`safe_space`) are ignored;
    /// if nothing queryable remains no request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] when every endpoint fails, or immediately when a
    /// failure would repeat on any mirror (bad query, unparseable body).
    pub async fn search_amenities(
        &self,
        bbox: &BoundingBox,
        categories: &[PlaceCategory],
    ) -> Result<Vec<Place>, GeoError> {
        let Some(query) = build_query(bbox, categories, self.timeout.as_secs()) else {
            return Ok(Vec::new());
        };
        let body = self.post_with_fallback(&query).await?;
        parse_places(&body, Utc::now())
    }

    /// Safe places within `radius_m` of `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// See [`Self::search_amenities`].
    pub async fn nearby_safe_places(
        &self,
        origin: Coordinates,
        radius_m: f64,
        categories: &[PlaceCategory],
    ) -> Result<Vec<(Place, f64)>, GeoError> {
        let bbox = BoundingBox::around(origin, radius_m);
        let places = self.search_amenities(&bbox, categories).await?;
        Ok(geo::within_radius(places, &origin, radius_m, |p| {
            p.coordinates
        }))
    }

    async fn post_with_fallback(&self, query: &str) -> Result<String, GeoError> {
        let mut last_error = GeoError::NoEndpoints;
        for endpoint in &self.endpoints {
            match self.post(endpoint, query).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(endpoint, %e, "overpass endpoint failed, trying next");
                    last_error = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error)
    }

    async fn post(&self, endpoint: &str, query: &str) -> Result<String, GeoError> {
        tracing::debug!(endpoint, "querying overpass");
        let resp = self
            .http
            .post(endpoint)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(format!("data={}", urlencoding::encode(query)))
            .send()
            .await?;
        Ok(check_response(resp).await?.text().await?)
    }
}

// ── Query and normalization ────────────────────────────────────────

const fn amenity(category: PlaceCategory) -> Option<&'static str> {
    match category {
        PlaceCategory::Police => Some("police"),
        PlaceCategory::Hospital => Some("hospital"),
        PlaceCategory::SafeSpace => None,
    }
}

fn category_for(amenity: &str) -> Option<PlaceCategory> {
    match amenity {
        "police" => Some(PlaceCategory::Police),
        "hospital" => Some(PlaceCategory::Hospital),
        _ => None,
    }
}

/// Overpass QL for the amenities of `categories` inside `bbox`.
fn build_query(
    bbox: &BoundingBox,
    categories: &[PlaceCategory],
    timeout_secs: u64,
) -> Option<String> {
    let mut amenities: Vec<&str> = categories.iter().copied().filter_map(amenity).collect();
    amenities.sort_unstable();
    amenities.dedup();
    if amenities.is_empty() {
        return None;
    }

    let filter = format!("[\"amenity\"~\"^({})$\"]", amenities.join("|"));
    let area = format!(
        "({:.6},{:.6},{:.6},{:.6})",
        bbox.south, bbox.west, bbox.north, bbox.east
    );
    Some(format!(
        "[out:json][timeout:{timeout_secs}];\n(\n  node{filter}{area};\n  way{filter}{area};\n);\nout center;"
    ))
}

fn parse_places(body: &str, fetched_at: DateTime<Utc>) -> Result<Vec<Place>, GeoError> {
    let data: OverpassResponse =
        serde_json::from_str(body).map_err(|e| GeoError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    Ok(data
        .elements
        .into_iter()
        .filter_map(|element| to_place(element, fetched_at))
        .filter(|place| seen.insert(place.id.clone()))
        .collect())
}

fn to_place(element: Element, fetched_at: DateTime<Utc>) -> Option<Place> {
    let category = element.tags.get("amenity").and_then(|a| category_for(a.as_str()))?;
    let coordinates = match (element.lat, element.lon, &element.center) {
        (Some(lat), Some(lon), _) => Coordinates::new(lat, lon),
        (_, _, Some(center)) => Coordinates::new(center.lat, center.lon),
        _ => return None,
    };
    if !coordinates.is_valid() {
        return None;
    }

    let tag = |key: &str| {
        element
            .tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let name = tag("name")
        .or_else(|| tag("name:en"))
        .unwrap_or_else(|| category.fallback_name().to_string());
    let phone = tag("phone").or_else(|| tag("contact:phone"));
    let address = tag("addr:full").or_else(|| street_address(&element.tags));

    Some(Place {
        id: osm_place_id(&element.kind, element.id),
        category,
        name,
        coordinates,
        phone,
        address,
        added_by: None,
        created_at: fetched_at,
    })
}

/// "12 Rue de la Paix, Paris" from the `addr:*` tags, when a street is known.
fn street_address(tags: &HashMap<String, String>) -> Option<String> {
    let street = tags.get("addr:street")?;
    let mut line = match tags.get("addr:housenumber") {
        Some(number) => format!("{number} {street}"),
        None => street.clone(),
    };
    if let Some(city) = tags.get("addr:city") {
        line.push_str(", ");
        line.push_str(city);
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const FIXTURE: &str = r#"{
        "version": 0.6,
        "generator": "Overpass API",
        "elements": [
            {
                "type": "node",
                "id": 1001,
                "lat": 48.8530,
                "lon": 2.3499,
                "tags": {
                    "amenity": "police",
                    "name": "Commissariat du 4e",
                    "phone": "+33 1 40 79 06 00",
                    "addr:housenumber": "27",
                    "addr:street": "Boulevard Bourdon",
                    "addr:city": "Paris"
                }
            },
            {
                "type": "way",
                "id": 2002,
                "center": { "lat": 48.8414, "lon": 2.3701 },
                "tags": { "amenity": "hospital" }
            },
            {
                "type": "node",
                "id": 1001,
                "lat": 48.8530,
                "lon": 2.3499,
                "tags": { "amenity": "police" }
            },
            {
                "type": "way",
                "id": 3003,
                "tags": { "amenity": "hospital", "name": "No geometry" }
            },
            {
                "type": "node",
                "id": 4004,
                "lat": 48.85,
                "lon": 2.35,
                "tags": { "amenity": "cafe", "name": "Not a safe place" }
            }
        ]
    }"#;

    fn fetched_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-05-04T21:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn parses_nodes_and_way_centers() {
        let places = parse_places(FIXTURE, fetched_at()).unwrap();
        let ids: Vec<&str> = places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["osm-node-1001", "osm-way-2002"]);

        let police = &places[0];
        assert_eq!(police.category, PlaceCategory::Police);
        assert_eq!(police.name, "Commissariat du 4e");
        assert_eq!(police.phone.as_deref(), Some("+33 1 40 79 06 00"));
        assert_eq!(
            police.address.as_deref(),
            Some("27 Boulevard Bourdon, Paris")
        );
        assert!(police.added_by.is_none());

        let hospital = &places[1];
        assert_eq!(hospital.coordinates, Coordinates::new(48.8414, 2.3701));
        assert_eq!(hospital.name, "Unnamed hospital");
        assert!(hospital.phone.is_none());
        assert!(hospital.address.is_none());
    }

    #[test]
    fn empty_and_malformed_bodies() {
        assert!(parse_places(r#"{"elements": []}"#, fetched_at()).unwrap().is_empty());
        assert!(parse_places("{}", fetched_at()).unwrap().is_empty());
        let err = parse_places("<html>busy</html>", fetched_at()).unwrap_err();
        assert!(matches!(err, GeoError::Parse(_)));
    }

    #[test]
    fn query_covers_nodes_and_ways_in_the_box() {
        let bbox = BoundingBox {
            south: 48.8,
            west: 2.3,
            north: 48.9,
            east: 2.4,
        };
        let query = build_query(
            &bbox,
            &[PlaceCategory::Police, PlaceCategory::Hospital, PlaceCategory::Police],
            25,
        )
        .unwrap();
        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains(
            "node[\"amenity\"~\"^(hospital|police)$\"](48.800000,2.300000,48.900000,2.400000);"
        ));
        assert!(query.contains("way[\"amenity\"~\"^(hospital|police)$\"]"));
        assert!(query.ends_with("out center;"));
    }

    #[test]
    fn safe_spaces_alone_produce_no_query() {
        let bbox = BoundingBox::around(Coordinates::new(0.0, 0.0), 1_000.0);
        assert!(build_query(&bbox, &[PlaceCategory::SafeSpace], 25).is_none());
        assert!(build_query(&bbox, &[], 25).is_none());
    }

    #[test]
    fn blank_endpoints_are_dropped() {
        let client = OverpassClient::new(
            vec![" ".into(), "http://localhost:1/api".into()],
            Duration::from_secs(1),
        );
        assert_eq!(client.endpoints(), &["http://localhost:1/api".to_string()]);
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/interpreter", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        url
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    /// A URL on a port nobody listens on.
    async fn dead_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/api/interpreter")
    }

    #[tokio::test]
    async fn falls_back_to_next_endpoint_on_server_error() {
        let busy = serve_once("504 Gateway Timeout", "busy").await;
        let healthy = serve_once("200 OK", FIXTURE).await;
        let client = OverpassClient::new(vec![busy, healthy], Duration::from_secs(5));

        let bbox = BoundingBox::around(Coordinates::new(48.85, 2.35), 5_000.0);
        let places = client
            .search_amenities(&bbox, &[PlaceCategory::Police, PlaceCategory::Hospital])
            .await
            .unwrap();
        assert_eq!(places.len(), 2);
    }

    #[tokio::test]
    async fn falls_back_after_connection_refused() {
        let dead = dead_endpoint().await;
        let healthy = serve_once("200 OK", FIXTURE).await;
        let client = OverpassClient::new(vec![dead, healthy], Duration::from_secs(5));

        let origin = Coordinates::new(48.8530, 2.3499);
        let nearby = client
            .nearby_safe_places(origin, 1_000.0, &[PlaceCategory::Police, PlaceCategory::Hospital])
            .await
            .unwrap();
        // The hospital way center is ~2 km away.
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].0.id, "osm-node-1001");
        assert!(nearby[0].1 < 1.0);
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let rejecting = serve_once("400 Bad Request", "parse error in query").await;
        let dead = dead_endpoint().await;
        let client = OverpassClient::new(vec![rejecting, dead], Duration::from_secs(5));

        let bbox = BoundingBox::around(Coordinates::new(48.85, 2.35), 5_000.0);
        let err = client
            .search_amenities(&bbox, &[PlaceCategory::Police])
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::Api { status: 400, .. }));
    }

    #[tokio::test]
    async fn all_endpoints_failing_reports_the_last_error() {
        let client = OverpassClient::new(
            vec![dead_endpoint().await, dead_endpoint().await],
            Duration::from_secs(5),
        );
        let bbox = BoundingBox::around(Coordinates::new(48.85, 2.35), 5_000.0);
        let err = client
            .search_amenities(&bbox, &[PlaceCategory::Hospital])
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::Http(_)));
    }

    #[tokio::test]
    async fn no_endpoints_is_an_error() {
        let client = OverpassClient::new(Vec::new(), Duration::from_secs(1));
        let bbox = BoundingBox::around(Coordinates::new(48.85, 2.35), 5_000.0);
        let err = client
            .search_amenities(&bbox, &[PlaceCategory::Police])
            .await
            .unwrap_err();
        assert!(matches!(err, GeoError::NoEndpoints));
    }

    #[tokio::test]
    #[ignore = "hits the public Overpass API"]
    async fn live_search_around_paris() {
        let client = OverpassClient::default();
        let nearby = client
            .nearby_safe_places(
                Coordinates::new(48.8566, 2.3522),
                2_000.0,
                &[PlaceCategory::Police, PlaceCategory::Hospital],
            )
            .await
            .unwrap();
        assert!(!nearby.is_empty());
    }
}
