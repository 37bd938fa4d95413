use serde::Deserialize;

/// One article as Finnhub sends it. Nothing is trusted until [`check`] has run.
#[derive(Debug, Deserialize)]
pub(crate) struct RawArticle {
    #[serde(default)]
    pub(crate) id: Option<i64>,
    #[serde(default)]
    pub(crate) headline: Option<String>,
    #[serde(default)]
    pub(crate) summary: Option<String>,
    #[serde(default)]
    pub(crate) url: Option<String>,
    #[serde(default)]
    pub(crate) datetime: Option<i64>,
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) image: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) related: Option<String>,
}

/// An article whose headline, summary, url and publish time are all usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidArticle {
    pub(crate) id: i64,
    pub(crate) headline: String,
    pub(crate) summary: String,
    pub(crate) url: String,
    /// Unix seconds, always positive.
    pub(crate) datetime: i64,
    pub(crate) source: Option<String>,
    pub(crate) image: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) related: Option<String>,
}

impl ValidArticle {
    /// Identity used to drop repeats from the general feed.
    pub(crate) fn dedup_key(&self) -> String {
        format!("{}-{}-{}", self.id, self.url, self.headline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// The item was not an object of the expected shape.
    Malformed,
    MissingHeadline,
    MissingSummary,
    MissingUrl,
    MissingDatetime,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Checked {
    Valid(ValidArticle),
    Rejected(Rejection),
}

impl Checked {
    pub(crate) fn valid(self) -> Option<ValidArticle> {
        match self {
            Checked::Valid(a) => Some(a),
            Checked::Rejected(_) => None,
        }
    }
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Validates one element of a provider news array.
pub(crate) fn check(value: serde_json::Value) -> Checked {
    let Ok(raw) = serde_json::from_value::<RawArticle>(value) else {
        return Checked::Rejected(Rejection::Malformed);
    };
    let Some(headline) = non_blank(raw.headline) else {
        return Checked::Rejected(Rejection::MissingHeadline);
    };
    let Some(summary) = non_blank(raw.summary) else {
        return Checked::Rejected(Rejection::MissingSummary);
    };
    let Some(url) = non_blank(raw.url) else {
        return Checked::Rejected(Rejection::MissingUrl);
    };
    let Some(datetime) = raw.datetime.filter(|t| *t > 0) else {
        return Checked::Rejected(Rejection::MissingDatetime);
    };

    Checked::Valid(ValidArticle {
        id: raw.id.unwrap_or_default(),
        headline,
        summary,
        url,
        datetime,
        source: non_blank(raw.source),
        image: non_blank(raw.image),
        category: non_blank(raw.category),
        related: non_blank(raw.related),
    })
}

/// Validates a whole provider array, keeping only the usable articles.
pub(crate) fn valid_articles(items: Vec<serde_json::Value>) -> Vec<ValidArticle> {
    items.into_iter().filter_map(|v| check(v).valid()).collect()
}
