//! Environment-driven settings for the server binary.

use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::core::{FinnhubClient, FinnhubError, cache::DEFAULT_MAX_ENTRIES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    /// `None` when neither key variable is set or both are blank.
    pub finnhub_api_key: Option<String>,
    pub finnhub_base_url: Option<Url>,
    pub host: String,
    pub port: u16,
    /// Value of `Access-Control-Allow-Origin`.
    pub frontend_origin: String,
    pub cache_max_entries: usize,
    pub upstream_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("finnhub_api_key", &self.finnhub_api_key.as_ref().map(|_| "<redacted>"))
            .field("finnhub_base_url", &self.finnhub_base_url.as_ref().map(Url::as_str))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("frontend_origin", &self.frontend_origin)
            .field("cache_max_entries", &self.cache_max_entries)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            finnhub_api_key: None,
            finnhub_base_url: None,
            host: "0.0.0.0".to_string(),
            port: 3001,
            frontend_origin: "http://localhost:3000".to_string(),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            upstream_timeout: Duration::from_secs(10),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        _ => Ok(default),
    }
}

impl Config {
    /// Reads the process environment, after loading a `.env` file if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable numbers or URLs.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for unparseable numbers or URLs.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let finnhub_api_key = ["FINNHUB_API_KEY", "NEXT_PUBLIC_FINNHUB_API_KEY"]
            .into_iter()
            .filter_map(&get)
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty());

        let finnhub_base_url = match get("FINNHUB_BASE_URL") {
            Some(raw) if !raw.trim().is_empty() => Some(Url::parse(raw.trim()).map_err(|_| {
                ConfigError::Invalid {
                    key: "FINNHUB_BASE_URL",
                    value: raw.clone(),
                }
            })?),
            _ => None,
        };

        let timeout_secs: u64 = parse_or(
            "UPSTREAM_TIMEOUT_SECS",
            get("UPSTREAM_TIMEOUT_SECS"),
            defaults.upstream_timeout.as_secs(),
        )?;

        Ok(Self {
            finnhub_api_key,
            finnhub_base_url,
            host: get("HOST")
                .filter(|h| !h.trim().is_empty())
                .unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            frontend_origin: get("FRONTEND_ORIGIN")
                .filter(|o| !o.trim().is_empty())
                .unwrap_or(defaults.frontend_origin),
            cache_max_entries: parse_or(
                "CACHE_MAX_ENTRIES",
                get("CACHE_MAX_ENTRIES"),
                defaults.cache_max_entries,
            )?,
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Builds the Finnhub client these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn finnhub_client(&self) -> Result<FinnhubClient, FinnhubError> {
        let mut builder = FinnhubClient::builder()
            .timeout(self.upstream_timeout)
            .cache_max_entries(self.cache_max_entries);
        if let Some(key) = &self.finnhub_api_key {
            builder = builder.api_key(key.clone());
        }
        if let Some(url) = &self.finnhub_base_url {
            builder = builder.base_url(url.clone());
        }
        builder.build()
    }
}
