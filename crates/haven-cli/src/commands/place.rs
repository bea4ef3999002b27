use haven_core::entities::Place;
use haven_core::enums::{ConfidenceLevel, PlaceCategory};
use haven_core::geo::Coordinates;
use haven_db::repos::place::NewPlace;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{PlaceCategoryArg, PlaceCommands};
use crate::commands::shared::change::round_meters;
use crate::commands::shared::limit::effective_limit;
use crate::context::AppContext;
use crate::output::output;

/// A place near the searched point, with what the community thinks of it.
#[derive(Debug, Serialize)]
struct NearbyPlace {
    #[serde(flatten)]
    place: Place,
    distance_m: f64,
    unified_score: u32,
    confidence_level: ConfidenceLevel,
    total_feedback: u32,
}

/// Handle `haven place`.
pub async fn handle(
    action: &PlaceCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let default_limit = ctx.config.general.default_limit;
    match action {
        PlaceCommands::Add {
            name,
            category,
            lat,
            lng,
            phone,
            address,
        } => {
            let place = ctx
                .service
                .add_place(
                    ctx.owner(),
                    NewPlace {
                        name: name.clone(),
                        category: (*category).into(),
                        coordinates: Coordinates::new(*lat, *lng),
                        phone: phone.clone(),
                        address: address.clone(),
                    },
                )
                .await?;
            output(&place, flags.format)
        }
        PlaceCommands::List { category, limit } => {
            let limit = effective_limit(*limit, flags.limit, default_limit);
            let places = ctx
                .service
                .list_places(category.map(Into::into), limit)
                .await?;
            output(&places, flags.format)
        }
        PlaceCommands::Nearby {
            lat,
            lng,
            radius,
            limit,
        } => {
            let limit = effective_limit(*limit, flags.limit, default_limit);
            let found = ctx
                .service
                .nearby_places(Coordinates::new(*lat, *lng), *radius, limit)
                .await?;
            output(&with_scores(ctx, found).await?, flags.format)
        }
        PlaceCommands::Search {
            lat,
            lng,
            radius,
            category,
            limit,
        } => {
            let origin = Coordinates::new(*lat, *lng);
            if !origin.is_valid() {
                anyhow::bail!("invalid search point ({lat}, {lng})");
            }
            let radius = radius.unwrap_or(ctx.config.geodata.search_radius_m);
            let categories = search_categories(category);
            let limit = effective_limit(*limit, flags.limit, default_limit) as usize;

            let mut found = ctx
                .geodata
                .nearby_safe_places(origin, radius, &categories)
                .await?;
            tracing::debug!(found = found.len(), radius, "geodata search finished");
            found.truncate(limit);
            output(&with_scores(ctx, found).await?, flags.format)
        }
    }
}

fn search_categories(requested: &[PlaceCategoryArg]) -> Vec<PlaceCategory> {
    if requested.is_empty() {
        vec![PlaceCategory::Police, PlaceCategory::Hospital]
    } else {
        requested.iter().copied().map(Into::into).collect()
    }
}

async fn with_scores(
    ctx: &AppContext,
    places: Vec<(Place, f64)>,
) -> anyhow::Result<Vec<NearbyPlace>> {
    let mut out = Vec::with_capacity(places.len());
    for (place, distance) in places {
        let score = ctx.service.get_place_score(&place.id).await?;
        out.push(NearbyPlace {
            place,
            distance_m: round_meters(distance),
            unified_score: score.unified_score,
            confidence_level: score.confidence_level,
            total_feedback: score.total_feedback,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn search_defaults_to_police_and_hospitals() {
        assert_eq!(
            search_categories(&[]),
            vec![PlaceCategory::Police, PlaceCategory::Hospital]
        );
        assert_eq!(
            search_categories(&[PlaceCategoryArg::Hospital]),
            vec![PlaceCategory::Hospital]
        );
    }
}
