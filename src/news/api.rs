use std::collections::HashSet;
use std::time::Duration;

use chrono::{Days, NaiveDate};
use futures::future::join_all;

use crate::{
    core::{
        FinnhubClient, FinnhubError,
        client::{CacheMode, RetryConfig},
    },
    news::{
        model::MarketNewsArticle,
        wire::{self, ValidArticle},
    },
};

/// Upper bound on articles returned by one call.
pub(crate) const MAX_ARTICLES: usize = 6;
/// How many unique general-feed articles are kept before formatting.
const GENERAL_POOL: usize = 20;
const NEWS_TTL: Duration = Duration::from_secs(300);
const LOOKBACK_DAYS: u64 = 5;

/// Trims, uppercases and drops blank symbols. Repeats are kept.
pub(crate) fn normalize_symbols(symbols: &[String]) -> Vec<String> {
    symbols
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Distinct symbols in first-seen order, and for every input position the index
/// of its symbol in that list.
fn distinct_with_slots(symbols: &[String]) -> (Vec<String>, Vec<usize>) {
    let mut distinct: Vec<String> = Vec::new();
    let slots = symbols
        .iter()
        .map(|sym| match distinct.iter().position(|d| d == sym) {
            Some(i) => i,
            None => {
                distinct.push(sym.clone());
                distinct.len() - 1
            }
        })
        .collect();
    (distinct, slots)
}

/// An item picked by [`round_robin`], with the index of the list it came from.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Picked<T> {
    pub(crate) item: T,
    pub(crate) source: usize,
    pub(crate) round: usize,
}

/// Walks `slots` once per round, taking the next item of the list each slot points
/// at, until `cap` items are picked or a round picks nothing. A list named by two
/// slots gives up to two items per round.
pub(crate) fn round_robin<T>(lists: Vec<Vec<T>>, slots: &[usize], cap: usize) -> Vec<Picked<T>> {
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    let mut picked = Vec::with_capacity(cap);

    'rounds: for round in 0..cap {
        let mut progressed = false;
        for &source in slots {
            let Some(item) = iters.get_mut(source).and_then(Iterator::next) else {
                continue;
            };
            progressed = true;
            picked.push(Picked { item, source, round });
            if picked.len() >= cap {
                break 'rounds;
            }
        }
        if !progressed {
            break;
        }
    }
    picked
}

pub(super) async fn fetch_news(
    client: &FinnhubClient,
    symbols: &[String],
    today: NaiveDate,
    cache_mode: CacheMode,
    retry_override: Option<&RetryConfig>,
) -> Result<Vec<MarketNewsArticle>, FinnhubError> {
    collect_news(client, symbols, today, cache_mode, retry_override)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "news fetch failed");
            FinnhubError::NewsUnavailable
        })
}

async fn collect_news(
    client: &FinnhubClient,
    symbols: &[String],
    today: NaiveDate,
    cache_mode: CacheMode,
    retry_override: Option<&RetryConfig>,
) -> Result<Vec<MarketNewsArticle>, FinnhubError> {
    if !client.has_api_key() {
        return Err(FinnhubError::MissingApiKey);
    }

    let symbols = normalize_symbols(symbols);
    if !symbols.is_empty() {
        let from = today.checked_sub_days(Days::new(LOOKBACK_DAYS)).unwrap_or(today);
        let (distinct, slots) = distinct_with_slots(&symbols);
        let lists = join_all(distinct.iter().map(|sym| {
            company_news(client, sym, from, today, cache_mode, retry_override)
        }))
        .await;

        let mut collected: Vec<MarketNewsArticle> = round_robin(lists, &slots, MAX_ARTICLES)
            .into_iter()
            .map(|p| MarketNewsArticle::company(p.item, &distinct[p.source], p.round))
            .collect();

        if !collected.is_empty() {
            collected.sort_by(|a, b| b.datetime.cmp(&a.datetime));
            collected.truncate(MAX_ARTICLES);
            return Ok(collected);
        }
        tracing::debug!(?symbols, "no company news, falling back to general feed");
    }

    general_news(client, cache_mode, retry_override).await
}

/// Valid articles for one symbol, newest first. A failed fetch counts as no articles.
async fn company_news(
    client: &FinnhubClient,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    cache_mode: CacheMode,
    retry_override: Option<&RetryConfig>,
) -> Vec<ValidArticle> {
    let from = from.format("%Y-%m-%d").to_string();
    let to = to.format("%Y-%m-%d").to_string();

    let fetched = match client.endpoint(
        "company-news",
        &[("symbol", symbol), ("from", from.as_str()), ("to", to.as_str())],
    ) {
        Ok(url) => {
            client
                .get_json::<Vec<serde_json::Value>>(url, NEWS_TTL, cache_mode, retry_override)
                .await
        }
        Err(e) => Err(e),
    };

    match fetched {
        Ok(items) => {
            let mut articles = wire::valid_articles(items);
            articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
            articles
        }
        Err(e) => {
            tracing::warn!(symbol, error = %e, "company news fetch failed");
            Vec::new()
        }
    }
}

async fn general_news(
    client: &FinnhubClient,
    cache_mode: CacheMode,
    retry_override: Option<&RetryConfig>,
) -> Result<Vec<MarketNewsArticle>, FinnhubError> {
    let url = client.endpoint("news", &[("category", "general")])?;
    let items: Vec<serde_json::Value> = client
        .get_json(url, NEWS_TTL, cache_mode, retry_override)
        .await?;

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for article in items.into_iter().filter_map(|v| wire::check(v).valid()) {
        if !seen.insert(article.dedup_key()) {
            continue;
        }
        unique.push(article);
        if unique.len() >= GENERAL_POOL {
            break;
        }
    }

    Ok(unique
        .into_iter()
        .take(MAX_ARTICLES)
        .enumerate()
        .map(|(idx, a)| MarketNewsArticle::general(a, idx))
        .collect())
}
