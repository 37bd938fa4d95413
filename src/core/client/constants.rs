//! Centralized constants for the default endpoint, UA and timeouts.

use std::time::Duration;

/// Identifies this proxy to the upstream provider.
pub(crate) const USER_AGENT: &str = concat!("signalist/", env!("CARGO_PKG_VERSION"));

/// Finnhub REST API base (endpoint paths are joined onto it, so keep the trailing slash).
pub(crate) const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1/";

/// Per-request deadline applied when the builder does not override it.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
