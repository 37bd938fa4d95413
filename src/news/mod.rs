mod api;
mod model;
mod wire;

pub use model::MarketNewsArticle;

use chrono::{NaiveDate, Utc};

use crate::core::{
    FinnhubClient, FinnhubError,
    client::{CacheMode, RetryConfig},
};

/// Fetches up to six recent articles for `symbols`, or general market news when
/// the symbols yield nothing.
///
/// # Errors
///
/// Returns [`FinnhubError::NewsUnavailable`] when no API key is configured or the
/// general feed cannot be fetched. Failures for individual symbols are not errors.
pub async fn get_news<I, S>(
    client: &FinnhubClient,
    symbols: I,
) -> Result<Vec<MarketNewsArticle>, FinnhubError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    NewsBuilder::new(client).symbols(symbols).fetch().await
}

/// A builder for fetching dashboard news.
#[derive(Debug, Clone)]
pub struct NewsBuilder {
    client: FinnhubClient,
    symbols: Vec<String>,
    as_of: Option<NaiveDate>,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
}

impl NewsBuilder {
    /// Creates a `NewsBuilder` with no symbols, which fetches general market news.
    pub fn new(client: &FinnhubClient) -> Self {
        Self {
            client: client.clone(),
            symbols: Vec::new(),
            as_of: None,
            cache_mode: CacheMode::Use,
            retry_override: None,
        }
    }

    /// Sets the ticker symbols to fetch company news for. Case and surrounding
    /// whitespace are ignored.
    #[must_use]
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the last day of the five-day company-news window. Defaults to today (UTC).
    #[must_use]
    pub const fn as_of(mut self, day: NaiveDate) -> Self {
        self.as_of = Some(day);
        self
    }

    /// Sets the cache mode for this specific API call.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Overrides the default retry policy for this specific API call.
    #[must_use]
    pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
        self.retry_override = cfg;
        self
    }

    /// Executes the request.
    ///
    /// # Errors
    ///
    /// Any failure is reported as the generic [`FinnhubError::NewsUnavailable`];
    /// the underlying cause is logged.
    #[tracing::instrument(skip(self), fields(symbols = ?self.symbols))]
    pub async fn fetch(self) -> Result<Vec<MarketNewsArticle>, FinnhubError> {
        let today = self.as_of.unwrap_or_else(|| Utc::now().date_naive());
        api::fetch_news(
            &self.client,
            &self.symbols,
            today,
            self.cache_mode,
            self.retry_override.as_ref(),
        )
        .await
    }
}
