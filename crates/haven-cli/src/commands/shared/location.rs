use std::time::Duration;

use haven_core::errors::LocationError;
use haven_core::geo::LocationFix;
use haven_geo::{FallbackProvider, LocationProvider, NoProvider, StaticProvider, acquire_fix};

use crate::cli::subcommands::LocationArgs;
use crate::context::AppContext;

/// Get a fix from the command-line position, falling back to the configured
/// default point when there is none.
///
/// With `required` unset a failure is logged and yields `None`.
pub async fn resolve_fix(
    args: &LocationArgs,
    ctx: &AppContext,
    required: bool,
) -> anyhow::Result<Option<LocationFix>> {
    let provider: Box<dyn LocationProvider> = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Box::new(StaticProvider::new(LocationFix {
            lat,
            lng,
            accuracy_meters: args.accuracy,
            captured_at: ctx.service.now(),
        })),
        _ => Box::new(NoProvider),
    };
    let fallback = ctx
        .config
        .location
        .fallback()
        .map(|point| FallbackProvider::new(point, ctx.service.clock().clone()));

    match acquire_with_fallback(provider.as_ref(), fallback.as_ref(), ctx.config.location.timeout()).await {
        Ok(fix) => Ok(Some(fix)),
        Err(error) if required => Err(error.into()),
        Err(error) => {
            tracing::warn!(%error, "continuing without a location");
            Ok(None)
        }
    }
}

/// Ask `provider`; on a denied permission or an unavailable fix use
/// `fallback` if there is one. A timeout is reported as is.
pub async fn acquire_with_fallback(
    provider: &dyn LocationProvider,
    fallback: Option<&FallbackProvider>,
    timeout: Duration,
) -> Result<LocationFix, LocationError> {
    match acquire_fix(provider, timeout).await {
        Err(error @ (LocationError::PermissionDenied | LocationError::Unavailable(_))) => {
            let Some(fallback) = fallback else {
                return Err(error);
            };
            tracing::warn!(%error, "using the configured fallback location");
            acquire_fix(fallback, timeout).await
        }
        other => other,
    }
}
