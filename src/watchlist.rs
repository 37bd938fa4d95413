//! Per-user watchlists.
//!
//! Persistence belongs to an external document store; [`WatchlistStore`] is the seam
//! the HTTP layer talks to. [`MemoryWatchlistStore`] backs tests and local runs.
//!
//! The HTTP layer only reads (`symbols_for`). `add` and `remove` are the write half
//! a document-store implementation provides for the frontend's own watchlist
//! actions, and are how [`MemoryWatchlistStore`] is seeded.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::search::StockWithWatchlistStatus;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("symbol must not be empty")]
    EmptySymbol,
    #[error("watchlist backend failed: {0}")]
    Backend(String),
}

/// One watched symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub symbol: String,
    pub company: String,
    pub added_at: DateTime<Utc>,
}

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Symbols watched by `user`, oldest first. Unknown users have an empty list.
    async fn symbols_for(&self, user: &str) -> Result<Vec<String>, WatchlistError>;

    /// Adds `symbol` to the user's list. Returns `false` if it was already there.
    async fn add(&self, user: &str, symbol: &str, company: &str) -> Result<bool, WatchlistError>;

    /// Removes `symbol` from the user's list. Returns `false` if it was not there.
    async fn remove(&self, user: &str, symbol: &str) -> Result<bool, WatchlistError>;
}

fn normalize(symbol: &str) -> Result<String, WatchlistError> {
    let s = symbol.trim().to_uppercase();
    if s.is_empty() {
        return Err(WatchlistError::EmptySymbol);
    }
    Ok(s)
}

#[derive(Debug, Default)]
pub struct MemoryWatchlistStore {
    lists: RwLock<HashMap<String, Vec<WatchlistItem>>>,
}

impl MemoryWatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatchlistStore for MemoryWatchlistStore {
    async fn symbols_for(&self, user: &str) -> Result<Vec<String>, WatchlistError> {
        let lists = self.lists.read().await;
        Ok(lists
            .get(user)
            .map(|items| items.iter().map(|i| i.symbol.clone()).collect())
            .unwrap_or_default())
    }

    async fn add(&self, user: &str, symbol: &str, company: &str) -> Result<bool, WatchlistError> {
        let symbol = normalize(symbol)?;
        let mut lists = self.lists.write().await;
        let items = lists.entry(user.to_string()).or_default();
        if items.iter().any(|i| i.symbol == symbol) {
            return Ok(false);
        }
        let company = company.trim();
        items.push(WatchlistItem {
            company: if company.is_empty() { symbol.clone() } else { company.to_string() },
            symbol,
            added_at: Utc::now(),
        });
        Ok(true)
    }

    async fn remove(&self, user: &str, symbol: &str) -> Result<bool, WatchlistError> {
        let symbol = normalize(symbol)?;
        let mut lists = self.lists.write().await;
        let Some(items) = lists.get_mut(user) else {
            return Ok(false);
        };
        let before = items.len();
        items.retain(|i| i.symbol != symbol);
        Ok(items.len() != before)
    }
}

/// Sets `is_in_watchlist` on each result from the user's watched symbols.
pub fn mark_watched(results: &mut [StockWithWatchlistStatus], watched: &[String]) {
    for r in results {
        r.is_in_watchlist = watched.iter().any(|w| w.eq_ignore_ascii_case(&r.symbol));
    }
}
