use std::sync::Arc;

use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum FinnhubError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The response body was not the JSON shape we expected.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider answered with a non-success status.
    #[error("Fetch failed {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body text, empty if it could not be read.
        body: String,
    },

    /// No Finnhub API key is configured.
    #[error("FINNHUB API key is not configured")]
    MissingApiKey,

    /// The generic failure surfaced by news fetching; provider detail is logged, not returned.
    #[error("Failed to fetch news")]
    NewsUnavailable,

    /// A failure produced by a computation another caller was already running for the same key.
    #[error(transparent)]
    Shared(Arc<FinnhubError>),
}

impl FinnhubError {
    /// Recovers an owned error from a coalesced cache computation.
    pub(crate) fn unshare(err: Arc<FinnhubError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(FinnhubError::Shared)
    }
}
