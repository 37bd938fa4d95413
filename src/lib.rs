//! signalist: market-data backend for the Signalist stock dashboard.
//!
//! Proxies Finnhub behind a bounded TTL cache and serves a small JSON API:
//! - [`news`]: round-robin company news with a general-market fallback.
//! - [`search`]: instrument search, or popular symbols for an empty query.
//! - [`server`]: actix-web routes and CORS handling.

pub mod config;
pub mod core;
pub mod news;
pub mod profile;
pub mod search;
pub mod server;
pub mod watchlist;

pub use crate::core::{
    CacheMode, Clock, FinnhubClient, FinnhubClientBuilder, FinnhubError, ManualClock,
    RetryConfig, SystemClock, TtlCache,
};
pub use news::{MarketNewsArticle, NewsBuilder, get_news};
pub use profile::{CompanyProfile, fetch_profile};
pub use search::{SearchBuilder, StockWithWatchlistStatus, search_stocks};
