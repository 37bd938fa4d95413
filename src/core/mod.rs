//! Core components of the `signalist` backend.
//!
//! This module contains the foundational building blocks shared by the API modules:
//! - The [`FinnhubClient`] and its builder.
//! - The primary [`FinnhubError`] type.
//! - The bounded [`TtlCache`] sitting in front of every upstream call.

/// Bounded TTL cache with request coalescing.
pub mod cache;
/// The Finnhub client (`FinnhubClient`), builder, and retry configuration.
pub mod client;
/// The primary error type (`FinnhubError`) for the crate.
pub mod error;

pub(crate) mod net;

// convenient re-exports so most code can just `use crate::core::FinnhubClient`
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use client::{BodyCache, CacheMode, FinnhubClient, FinnhubClientBuilder, RetryConfig};
pub use error::FinnhubError;
