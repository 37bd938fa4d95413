//! Company profile lookup.

mod api;
mod model;

pub use model::CompanyProfile;

pub(crate) use api::fetch_profile2;

use crate::core::{FinnhubClient, FinnhubError, client::CacheMode};

/// Loads the profile for a given symbol. `Ok(None)` means Finnhub has no data for it.
///
/// # Errors
///
/// Returns `FinnhubError` if no API key is configured, the network request fails,
/// or the response cannot be parsed.
pub async fn fetch_profile(
    client: &FinnhubClient,
    symbol: &str,
) -> Result<Option<CompanyProfile>, FinnhubError> {
    let symbol = symbol.trim().to_uppercase();
    api::fetch_profile2(client, &symbol, CacheMode::Use, None).await
}
