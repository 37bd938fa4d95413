use serde::{Deserialize, Serialize};

use super::wire::ValidArticle;

const COMPANY_SUMMARY_CHARS: usize = 200;
const GENERAL_SUMMARY_CHARS: usize = 150;

/// A news article as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketNewsArticle {
    /// Unique within one response, also across merged per-symbol feeds.
    pub id: i64,
    pub headline: String,
    /// Trimmed, shortened summary ending in `...`.
    pub summary: String,
    /// The publisher (e.g., "Reuters"), or a generic label when the provider gave none.
    pub source: String,
    pub url: String,
    /// The Unix timestamp (in seconds) of when the article was published.
    pub datetime: i64,
    /// Image URL, empty when absent.
    pub image: String,
    /// `company` for per-symbol news, otherwise the provider category.
    pub category: String,
    /// The symbol the article was fetched for, or the provider's related tickers.
    pub related: String,
}

fn shorten(summary: &str, max_chars: usize) -> String {
    let mut out: String = summary.trim().chars().take(max_chars).collect();
    out.push_str("...");
    out
}

impl MarketNewsArticle {
    /// Formats an article picked for `symbol` in interleave round `round`.
    pub(crate) fn company(article: ValidArticle, symbol: &str, round: usize) -> Self {
        let round = i64::try_from(round).unwrap_or_default();
        Self {
            id: article.datetime.saturating_mul(1000).saturating_add(round),
            headline: article.headline.trim().to_string(),
            summary: shorten(&article.summary, COMPANY_SUMMARY_CHARS),
            source: article.source.unwrap_or_else(|| "Company News".to_string()),
            url: article.url,
            datetime: article.datetime,
            image: article.image.unwrap_or_default(),
            category: "company".to_string(),
            related: symbol.to_string(),
        }
    }

    /// Formats the `index`-th article of the general market feed.
    pub(crate) fn general(article: ValidArticle, index: usize) -> Self {
        let index = i64::try_from(index).unwrap_or_default();
        Self {
            id: article.id.saturating_add(index),
            headline: article.headline.trim().to_string(),
            summary: shorten(&article.summary, GENERAL_SUMMARY_CHARS),
            source: article.source.unwrap_or_else(|| "Market News".to_string()),
            url: article.url,
            datetime: article.datetime,
            image: article.image.unwrap_or_default(),
            category: article.category.unwrap_or_else(|| "general".to_string()),
            related: article.related.unwrap_or_default(),
        }
    }
}
