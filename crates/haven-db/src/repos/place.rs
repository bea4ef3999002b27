//! User-contributed place repository.
//!
//! Geodata places are fetched live by `haven-geo` and never stored here;
//! only places people add themselves are persisted.

use haven_core::entities::Place;
use haven_core::enums::PlaceCategory;
use haven_core::errors::CoreError;
use haven_core::geo::{self, BoundingBox, Coordinates};
use haven_core::ids::PREFIX_PLACE;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::HavenService;

const PLACE_COLUMNS: &str = "id, category, name, lat, lng, phone, address, added_by, created_at";

/// Input for [`HavenService::add_place`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub name: String,
    pub category: PlaceCategory,
    pub coordinates: Coordinates,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl HavenService {
    /// Store a place contributed by `added_by`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` (wrapped) for a blank name or an
    /// invalid coordinate.
    pub async fn add_place(&self, added_by: &str, new: NewPlace) -> Result<Place, DatabaseError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("place name must not be empty".into()).into());
        }
        if !new.coordinates.is_valid() {
            return Err(CoreError::Validation(format!(
                "invalid place location ({}, {})",
                new.coordinates.lat, new.coordinates.lng
            ))
            .into());
        }

        let place = Place {
            id: self.db().generate_id(PREFIX_PLACE).await?,
            category: new.category,
            name: name.to_string(),
            coordinates: new.coordinates,
            phone: non_blank(new.phone),
            address: non_blank(new.address),
            added_by: Some(added_by.to_string()),
            created_at: self.now(),
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO places (id, category, name, lat, lng, phone, address, added_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    place.id.as_str(),
                    place.category.as_str(),
                    place.name.as_str(),
                    place.coordinates.lat,
                    place.coordinates.lng,
                    place.phone.as_deref(),
                    place.address.as_deref(),
                    place.added_by.as_deref(),
                    place.created_at.to_rfc3339()
                ],
            )
            .await?;

        tracing::debug!(place = %place.id, category = %place.category, "place added");
        Ok(place)
    }

    /// Get a stored place by ID.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` (wrapped) if no such place is stored.
    pub async fn get_place(&self, id: &str) -> Result<Place, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {PLACE_COLUMNS} FROM places WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("place", id))?;
        row_to_place(&row)
    }

    /// Most recently added places first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_places(
        &self,
        category: Option<PlaceCategory>,
        limit: u32,
    ) -> Result<Vec<Place>, DatabaseError> {
        let mut rows = match category {
            Some(category) => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {PLACE_COLUMNS} FROM places WHERE category = ?1
                             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
                        ),
                        libsql::params![category.as_str(), i64::from(limit)],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {PLACE_COLUMNS} FROM places
                             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                        ),
                        libsql::params![i64::from(limit)],
                    )
                    .await?
            }
        };

        let mut places = Vec::new();
        while let Some(row) = rows.next().await? {
            places.push(row_to_place(&row)?);
        }
        Ok(places)
    }

    /// Stored places within `radius_m` of `origin`, nearest first, with
    /// their distance in meters.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` (wrapped) for an invalid origin or a
    /// non-positive radius.
    pub async fn nearby_places(
        &self,
        origin: Coordinates,
        radius_m: f64,
        limit: u32,
    ) -> Result<Vec<(Place, f64)>, DatabaseError> {
        if !origin.is_valid() {
            return Err(CoreError::Validation(format!(
                "invalid origin ({}, {})",
                origin.lat, origin.lng
            ))
            .into());
        }
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(CoreError::Validation(format!("radius must be positive, got {radius_m}")).into());
        }

        // The box prefilter may include corners outside the circle; the exact
        // haversine filter below drops them.
        let bbox = BoundingBox::around(origin, radius_m);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PLACE_COLUMNS} FROM places
                     WHERE lat BETWEEN ?1 AND ?2 AND lng BETWEEN ?3 AND ?4"
                ),
                libsql::params![bbox.south, bbox.north, bbox.west, bbox.east],
            )
            .await?;
        let mut candidates = Vec::new();
        while let Some(row) = rows.next().await? {
            candidates.push(row_to_place(&row)?);
        }

        let mut nearby = geo::within_radius(candidates, &origin, radius_m, |p| p.coordinates);
        nearby.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(nearby)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn row_to_place(row: &libsql::Row) -> Result<Place, DatabaseError> {
    Ok(Place {
        id: row.get(0)?,
        category: parse_enum(&row.get::<String>(1)?)?,
        name: row.get(2)?,
        coordinates: Coordinates::new(row.get::<f64>(3)?, row.get::<f64>(4)?),
        phone: get_opt_string(row, 5)?,
        address: get_opt_string(row, 6)?,
        added_by: get_opt_string(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::test_service;

    fn new_place(name: &str, lat: f64, lng: f64) -> NewPlace {
        NewPlace {
            name: name.to_string(),
            category: PlaceCategory::SafeSpace,
            coordinates: Coordinates::new(lat, lng),
            phone: None,
            address: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn add_and_get_place() {
        let (svc, _clock) = test_service().await;
        let place = svc
            .add_place("alex", new_place("  Corner Cafe ", 51.5, -0.12))
            .await
            .unwrap();
        assert!(place.id.starts_with("plc-"));
        assert_eq!(place.name, "Corner Cafe");
        assert_eq!(place.address, None);
        assert_eq!(place.added_by.as_deref(), Some("alex"));
        assert_eq!(svc.get_place(&place.id).await.unwrap(), place);
    }

    #[tokio::test]
    async fn invalid_places_are_rejected() {
        let (svc, _clock) = test_service().await;
        assert!(svc.add_place("alex", new_place("", 0.0, 0.0)).await.unwrap_err().is_validation());
        assert!(
            svc.add_place("alex", new_place("Nowhere", 100.0, 0.0))
                .await
                .unwrap_err()
                .is_validation()
        );
        assert!(svc.get_place("plc-missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_places_newest_first_and_by_category() {
        let (svc, clock) = test_service().await;
        let first = svc.add_place("alex", new_place("First", 1.0, 1.0)).await.unwrap();
        clock.advance(Duration::minutes(1));
        let mut police = new_place("Station", 1.0, 1.0);
        police.category = PlaceCategory::Police;
        let second = svc.add_place("alex", police).await.unwrap();

        let all = svc.list_places(None, 10).await.unwrap();
        assert_eq!(all, vec![second.clone(), first]);
        let only_police = svc.list_places(Some(PlaceCategory::Police), 10).await.unwrap();
        assert_eq!(only_police, vec![second]);
        assert_eq!(svc.list_places(None, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn nearby_places_sorted_and_filtered_by_radius() {
        let (svc, _clock) = test_service().await;
        let far = svc.add_place("alex", new_place("Far", 0.0, 0.02)).await.unwrap();
        let near = svc.add_place("alex", new_place("Near", 0.0, 0.001)).await.unwrap();
        svc.add_place("alex", new_place("Other city", 10.0, 10.0)).await.unwrap();

        let nearby = svc
            .nearby_places(Coordinates::new(0.0, 0.0), 5_000.0, 10)
            .await
            .unwrap();
        let ids: Vec<&str> = nearby.iter().map(|(p, _)| p.id.as_str()).collect();
        assert_eq!(ids, vec![near.id.as_str(), far.id.as_str()]);
        assert!(nearby[0].1 < nearby[1].1);

        let tight = svc
            .nearby_places(Coordinates::new(0.0, 0.0), 500.0, 10)
            .await
            .unwrap();
        assert_eq!(tight.len(), 1);
    }
}
