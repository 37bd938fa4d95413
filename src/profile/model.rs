use serde::{Deserialize, Serialize};

/// Company profile from Finnhub's `stock/profile2` endpoint.
///
/// Every field is optional; Finnhub fills what it knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Listing venue, e.g. "NASDAQ NMS - GLOBAL MARKET".
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// IPO date as `YYYY-MM-DD`.
    #[serde(default)]
    pub ipo: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub weburl: Option<String>,
    #[serde(default, rename = "finnhubIndustry")]
    pub industry: Option<String>,
    /// Market capitalization in millions of `currency`.
    #[serde(default, rename = "marketCapitalization")]
    pub market_cap: Option<f64>,
}

impl CompanyProfile {
    /// Whether the profile carries neither a name nor a ticker, which is how
    /// Finnhub answers for symbols it does not cover.
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().is_none_or(|v| v.trim().is_empty());
        blank(&self.name) && blank(&self.ticker)
    }
}
