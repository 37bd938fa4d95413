use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::core::client::{CacheMode, RetryConfig};
use crate::core::{FinnhubClient, FinnhubError};
use crate::profile;

/// Upper bound on results returned by one search.
pub const MAX_RESULTS: usize = 15;
/// How many popular symbols are listed when the query is empty.
const POPULAR_LIMIT: usize = 10;
const SEARCH_TTL: Duration = Duration::from_secs(1800);

/// Symbols shown when the user has not typed anything yet, most prominent first.
pub const POPULAR_STOCK_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "ORCL", "CRM", "ADBE",
    "INTC", "AMD", "PYPL", "UBER", "SPOT", "SHOP", "PLTR", "SNOW", "COIN", "JPM", "V", "MA",
    "DIS", "KO",
];

/// A search hit, decorated with whether the requesting user already watches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockWithWatchlistStatus {
    /// Uppercased ticker.
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    /// Security type, e.g. "Common Stock".
    #[serde(rename = "type")]
    pub kind: String,
    /// Always `false` as returned by [`search_stocks`]; callers that know the user fill it in.
    pub is_in_watchlist: bool,
}

/* ---------------- Public API ---------------- */

/// Searches for symbols matching `query`, or lists popular symbols when it is blank.
///
/// Never fails: a missing API key or any upstream problem yields an empty list.
pub async fn search_stocks(client: &FinnhubClient, query: Option<&str>) -> Vec<StockWithWatchlistStatus> {
    SearchBuilder::new(client, query.unwrap_or_default())
        .fetch()
        .await
}

/// A builder for searching instruments on Finnhub.
#[derive(Debug, Clone)]
pub struct SearchBuilder {
    client: FinnhubClient,
    query: String,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
}

impl SearchBuilder {
    /// Creates a new `SearchBuilder` for a given search query.
    pub fn new(client: &FinnhubClient, query: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            query: query.into(),
            cache_mode: CacheMode::Use,
            retry_override: None,
        }
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

    /// Executes the search. Errors are logged and turned into an empty list.
    #[tracing::instrument(skip(self), fields(query = %self.query))]
    pub async fn fetch(self) -> Vec<StockWithWatchlistStatus> {
        if !self.client.has_api_key() {
            tracing::error!("FINNHUB API key not configured");
            return Vec::new();
        }
        match self.try_fetch().await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "stock search failed");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self) -> Result<Vec<StockWithWatchlistStatus>, FinnhubError> {
        let trimmed = self.query.trim();
        let hits = if trimmed.is_empty() {
            self.popular().await
        } else {
            self.text_search(trimmed).await?
        };

        Ok(hits
            .into_iter()
            .take(MAX_RESULTS)
            .map(Hit::into_status)
            .collect())
    }

    async fn popular(&self) -> Vec<Hit> {
        let symbols = &POPULAR_STOCK_SYMBOLS[..POPULAR_LIMIT.min(POPULAR_STOCK_SYMBOLS.len())];
        let profiles = join_all(symbols.iter().map(|sym| async move {
            let res = profile::fetch_profile2(
                &self.client,
                sym,
                self.cache_mode,
                self.retry_override.as_ref(),
            )
            .await;
            (*sym, res)
        }))
        .await;

        profiles
            .into_iter()
            .filter_map(|(sym, res)| match res {
                Ok(Some(p)) => Some(Hit {
                    symbol: sym.to_string(),
                    name: p.name.filter(|n| !n.trim().is_empty()).or(p.ticker),
                    exchange: p.exchange.filter(|e| !e.trim().is_empty()),
                    kind: Some("Common Stock".to_string()),
                }),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(symbol = sym, error = %e, "profile fetch failed");
                    None
                }
            })
            .collect()
    }

    async fn text_search(&self, query: &str) -> Result<Vec<Hit>, FinnhubError> {
        let url = self.client.endpoint("search", &[("q", query)])?;
        let env: SearchEnvelope = self
            .client
            .get_json(url, SEARCH_TTL, self.cache_mode, self.retry_override.as_ref())
            .await?;

        Ok(env
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| {
                let symbol = r.symbol.filter(|s| !s.trim().is_empty())?;
                Some(Hit {
                    symbol,
                    name: r.description.filter(|d| !d.trim().is_empty()),
                    exchange: None,
                    kind: r.kind.filter(|t| !t.trim().is_empty()),
                })
            })
            .collect())
    }
}

/// A search hit before defaults are applied.
struct Hit {
    symbol: String,
    name: Option<String>,
    exchange: Option<String>,
    kind: Option<String>,
}

impl Hit {
    fn into_status(self) -> StockWithWatchlistStatus {
        let symbol = self.symbol.trim().to_uppercase();
        StockWithWatchlistStatus {
            name: self.name.unwrap_or_else(|| symbol.clone()),
            exchange: self.exchange.unwrap_or_else(|| "US".to_string()),
            kind: self.kind.unwrap_or_else(|| "Stock".to_string()),
            is_in_watchlist: false,
            symbol,
        }
    }
}

/* ------------- Minimal serde mapping of /search ------------- */

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    result: Option<Vec<SearchItem>>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}
