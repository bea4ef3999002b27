//! Shared HTTP response helpers for the geodata client.

use crate::error::GeoError;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. A 429 becomes
/// [`GeoError::RateLimited`] (honouring `Retry-After`, 60 s when absent) and
/// any other non-success status becomes [`GeoError::Api`] with the body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, GeoError> {
    if resp.status() == 429 {
        let retry_after = parse_retry_after(&resp);
        return Err(GeoError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    if !resp.status().is_success() {
        return Err(GeoError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}
