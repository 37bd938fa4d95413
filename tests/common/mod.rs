#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use httpmock::{Method::GET, Mock, MockServer};
use serde_json::{Value, json};
use signalist::{Clock, FinnhubClient, FinnhubClientBuilder, RetryConfig};
use url::Url;

pub const TOKEN: &str = "test-token";

pub fn setup_server() -> MockServer {
    MockServer::start()
}

/// Builder pointed at the mock server, keyed, with retries off.
pub fn builder_for(server: &MockServer) -> FinnhubClientBuilder {
    FinnhubClient::builder()
        .api_key(TOKEN)
        .base_url(Url::parse(&format!("{}/api/v1/", server.base_url())).unwrap())
        .retry_config(RetryConfig::disabled())
}

pub fn client_for(server: &MockServer) -> FinnhubClient {
    builder_for(server).build().unwrap()
}

pub fn client_with_clock(server: &MockServer, clock: Arc<dyn Clock>) -> FinnhubClient {
    builder_for(server).clock(clock).build().unwrap()
}

/// Fixed "today" so the company-news window is predictable.
pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
}
pub const WINDOW_FROM: &str = "2025-03-09";
pub const WINDOW_TO: &str = "2025-03-14";

/// A valid Finnhub news item.
pub fn article(id: i64, headline: &str, datetime: i64) -> Value {
    json!({
        "id": id,
        "headline": headline,
        "summary": format!("{headline} in detail."),
        "url": format!("https://news.example.com/{id}"),
        "datetime": datetime,
        "source": "Wire",
        "image": "",
        "category": "company",
        "related": ""
    })
}

pub fn mock_company_news<'a>(server: &'a MockServer, symbol: &str, body: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/company-news")
            .query_param("symbol", symbol)
            .query_param("from", WINDOW_FROM)
            .query_param("to", WINDOW_TO)
            .query_param("token", TOKEN);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    })
}

pub fn mock_general_news(server: &MockServer, body: Value) -> Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/news")
            .query_param("category", "general")
            .query_param("token", TOKEN);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    })
}

pub fn mock_search<'a>(server: &'a MockServer, query: &str, body: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/search")
            .query_param("q", query)
            .query_param("token", TOKEN);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    })
}

pub fn mock_profile<'a>(server: &'a MockServer, symbol: &str, body: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/stock/profile2")
            .query_param("symbol", symbol)
            .query_param("token", TOKEN);
        then.status(200)
            .header("content-type", "application/json")
            .json_body(body);
    })
}
