//! `stock/profile2` API path.

use std::time::Duration;

use crate::core::{
    FinnhubClient, FinnhubError,
    client::{CacheMode, RetryConfig},
};

use super::CompanyProfile;

/// Profiles change rarely; keep them for an hour.
pub(crate) const PROFILE_TTL: Duration = Duration::from_secs(3600);

pub(crate) async fn fetch_profile2(
    client: &FinnhubClient,
    symbol: &str,
    cache_mode: CacheMode,
    retry_override: Option<&RetryConfig>,
) -> Result<Option<CompanyProfile>, FinnhubError> {
    let url = client.endpoint("stock/profile2", &[("symbol", symbol)])?;
    let profile: CompanyProfile = client
        .get_json(url, PROFILE_TTL, cache_mode, retry_override)
        .await?;

    if profile.is_empty() {
        tracing::debug!(symbol, "no profile coverage");
        return Ok(None);
    }
    Ok(Some(profile))
}
