//! Public client surface + builder.
//! Internals are split into `constants` (UA + defaults) and `retry` (backoff + cache modes).

mod constants;
mod retry;

pub use retry::{Backoff, CacheMode, RetryConfig};

use crate::core::{
    FinnhubError,
    cache::{Clock, DEFAULT_MAX_ENTRIES, SystemClock, TtlCache},
    net,
};
use constants::{DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Cache of raw upstream response bodies, keyed by request URL without the API token.
pub type BodyCache = TtlCache<String, FinnhubError>;

/// Client for the Finnhub REST API.
///
/// Cheap to clone: clones share the HTTP connection pool and the response cache.
#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
    retry: RetryConfig,
    cache: Arc<BodyCache>,
}

impl fmt::Debug for FinnhubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinnhubClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("retry", &self.retry)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl FinnhubClient {
    /// Create a new builder.
    pub fn builder() -> FinnhubClientBuilder {
        FinnhubClientBuilder::default()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The response cache shared by all clones of this client.
    pub fn cache(&self) -> &Arc<BodyCache> {
        &self.cache
    }

    /* -------- internal helpers used by the API modules -------- */

    /// Builds an endpoint URL. The API token is added only when the request is sent,
    /// so the result doubles as the cache key.
    pub(crate) fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FinnhubError> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    /// Fetches `endpoint` through the response cache and decodes the body as JSON.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Url,
        ttl: Duration,
        cache_mode: CacheMode,
        retry_override: Option<&RetryConfig>,
    ) -> Result<T, FinnhubError> {
        let token = self.api_key.as_deref().ok_or(FinnhubError::MissingApiKey)?;
        let key = endpoint.as_str().to_string();

        let mut url = endpoint;
        url.query_pairs_mut().append_pair("token", token);
        let http = self.http.clone();
        let retry = retry_override.unwrap_or(&self.retry).clone();
        let compute = move || net::fetch_text(http, url, retry);

        let body = match cache_mode {
            CacheMode::Use => self
                .cache
                .get_or_compute(&key, ttl, compute)
                .await
                .map_err(FinnhubError::unshare)?,
            CacheMode::Refresh => self
                .cache
                .refresh(&key, ttl, compute)
                .await
                .map_err(FinnhubError::unshare)?,
            CacheMode::Bypass => compute().await?,
        };

        Ok(serde_json::from_str(&body)?)
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct FinnhubClientBuilder {
    api_key: Option<String>,
    base_url: Option<Url>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    cache: Option<Arc<BodyCache>>,
    cache_max_entries: Option<usize>,
    clock: Option<Arc<dyn Clock>>,
}

impl FinnhubClientBuilder {
    /// Set the Finnhub API key. Empty or whitespace-only keys count as unset.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the API base (e.g., `https://finnhub.io/api/v1/`).
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the per-request deadline. Default: 10s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: 5s.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Set the retry policy used for every upstream call.
    pub fn retry_config(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Share an existing response cache. Takes precedence over `cache_max_entries` and `clock`.
    ///
    /// Cache keys never include the API key, so clients sharing a cache share response
    /// bodies even when they were built with different keys. Finnhub answers these
    /// endpoints the same for every key; give each client its own cache if that is
    /// not acceptable.
    pub fn cache(mut self, cache: Arc<BodyCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Bound the response cache. Default: 1024 entries.
    pub fn cache_max_entries(mut self, n: usize) -> Self {
        self.cache_max_entries = Some(n);
        self
    }

    /// Clock used for cache expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the default base URL cannot be parsed or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<FinnhubClient, FinnhubError> {
        let mut base_url = match self.base_url {
            Some(u) => u,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT))
            .build()?;

        let cache = self.cache.unwrap_or_else(|| {
            Arc::new(TtlCache::with_clock(
                self.cache_max_entries.unwrap_or(DEFAULT_MAX_ENTRIES),
                self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            ))
        });

        Ok(FinnhubClient {
            http,
            base_url,
            api_key: self
                .api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            retry: self.retry.unwrap_or_default(),
            cache,
        })
    }
}
