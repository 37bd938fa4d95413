use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::GET;
use serde_json::json;
use signalist::{FinnhubClient, FinnhubError, ManualClock, NewsBuilder};

use crate::common::{
    article, as_of, client_for, client_with_clock, mock_company_news, mock_general_news,
    setup_server,
};

const T0: i64 = 1_741_900_000;

fn articles(prefix: i64, n: i64) -> serde_json::Value {
    let items: Vec<_> = (0..n)
        .map(|i| article(prefix + i, &format!("story {}", prefix + i), T0 + prefix + i))
        .collect();
    json!(items)
}

#[tokio::test]
async fn two_symbols_share_the_six_slots_fairly() {
    let server = setup_server();
    let aapl = mock_company_news(&server, "AAPL", articles(100, 8));
    let msft = mock_company_news(&server, "MSFT", articles(200, 8));
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["aapl", " MSFT "])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    aapl.assert();
    msft.assert();
    assert_eq!(news.len(), 6);

    let mut per_symbol: HashMap<&str, usize> = HashMap::new();
    for a in &news {
        *per_symbol.entry(a.related.as_str()).or_default() += 1;
        assert_eq!(a.category, "company");
        assert!(a.summary.ends_with("..."));
    }
    assert_eq!(per_symbol.get("AAPL"), Some(&3));
    assert_eq!(per_symbol.get("MSFT"), Some(&3));

    // round 0 picked one article from each symbol
    let round0: Vec<_> = news.iter().filter(|a| a.id % 1000 == 0).collect();
    assert_eq!(round0.len(), 2);
    assert_ne!(round0[0].related, round0[1].related);

    assert!(news.windows(2).all(|w| w[0].datetime >= w[1].datetime));
}

#[tokio::test]
async fn a_thin_symbol_leaves_room_for_the_other() {
    let server = setup_server();
    mock_company_news(&server, "AAPL", articles(100, 1));
    mock_company_news(&server, "NVDA", articles(300, 9));
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["AAPL", "NVDA"])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    assert_eq!(news.len(), 6);
    assert_eq!(news.iter().filter(|a| a.related == "AAPL").count(), 1);
    assert_eq!(news.iter().filter(|a| a.related == "NVDA").count(), 5);
}

#[tokio::test]
async fn repeated_symbol_draws_twice_per_round() {
    let server = setup_server();
    let aapl = mock_company_news(&server, "AAPL", articles(100, 8));
    let msft = mock_company_news(&server, "MSFT", articles(200, 8));
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["AAPL", "aapl", "MSFT"])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    aapl.assert_calls(1);
    msft.assert_calls(1);
    assert_eq!(news.len(), 6);
    assert_eq!(news.iter().filter(|a| a.related == "AAPL").count(), 4);
    assert_eq!(news.iter().filter(|a| a.related == "MSFT").count(), 2);

    // no article is handed out twice
    let mut ids: Vec<i64> = news.iter().map(|a| a.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 6);
}

#[tokio::test]
async fn single_symbol_returns_its_six_most_recent() {
    let server = setup_server();
    // provider order is deliberately not chronological
    let body = json!([
        article(1, "a", T0 + 10),
        article(2, "b", T0 + 80),
        article(3, "c", T0 + 30),
        article(4, "d", T0 + 70),
        article(5, "e", T0 + 20),
        article(6, "f", T0 + 60),
        article(7, "g", T0 + 50),
        article(8, "h", T0 + 40),
    ]);
    mock_company_news(&server, "TSLA", body);
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["TSLA"])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    let times: Vec<i64> = news.iter().map(|a| a.datetime - T0).collect();
    assert_eq!(times, [80, 70, 60, 50, 40, 30]);
    assert!(news.iter().all(|a| a.related == "TSLA"));
    assert!(news.iter().all(|a| a.source == "Wire"));
}

#[tokio::test]
async fn invalid_articles_never_surface() {
    let server = setup_server();
    let body = json!([
        {"id": 1, "headline": "", "summary": "s", "url": "https://x/1", "datetime": T0},
        {"id": 2, "headline": "no url", "summary": "s", "datetime": T0},
        {"id": 3, "headline": "no time", "summary": "s", "url": "https://x/3"},
        "not an object",
        article(4, "good", T0 + 4),
    ]);
    mock_company_news(&server, "AMD", body);
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["AMD"])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    assert_eq!(news.len(), 1);
    assert_eq!(news[0].headline, "good");
    assert_eq!(news[0].id, (T0 + 4) * 1000);
}

#[tokio::test]
async fn failing_symbol_does_not_sink_the_batch() {
    let server = setup_server();
    let broken = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/company-news")
            .query_param("symbol", "META");
        then.status(500).body("upstream exploded");
    });
    mock_company_news(&server, "NFLX", articles(400, 2));
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["META", "NFLX"])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    broken.assert();
    assert_eq!(news.len(), 2);
    assert!(news.iter().all(|a| a.related == "NFLX"));
}

#[tokio::test]
async fn empty_company_news_falls_back_to_general_feed() {
    let server = setup_server();
    let company = mock_company_news(&server, "ORCL", json!([]));
    let general = mock_general_news(
        &server,
        json!([article(10, "markets rally", T0), article(11, "oil slips", T0 - 5)]),
    );
    let client = client_for(&server);

    let news = NewsBuilder::new(&client)
        .symbols(["ORCL"])
        .as_of(as_of())
        .fetch()
        .await
        .unwrap();

    company.assert();
    general.assert();
    assert_eq!(news.len(), 2);
    assert_eq!(news[0].id, 10);
    assert_eq!(news[1].id, 12);
    assert_eq!(news[0].category, "company");
}

#[tokio::test]
async fn general_feed_drops_duplicates_and_caps_at_six() {
    let server = setup_server();
    let dup = article(1, "same story", T0);
    let mut items = vec![dup.clone(), dup.clone(), dup];
    items.extend((2..12).map(|i| article(i, &format!("story {i}"), T0 - i)));
    let mut no_category = article(50, "uncategorized", T0);
    no_category.as_object_mut().unwrap().remove("category");
    items.insert(1, no_category);
    mock_general_news(&server, json!(items));
    let client = client_for(&server);

    let news = NewsBuilder::new(&client).fetch().await.unwrap();

    assert_eq!(news.len(), 6);
    assert_eq!(news.iter().filter(|a| a.headline == "same story").count(), 1);
    assert_eq!(news[1].category, "general");
    assert_eq!(news[1].id, 51);
    assert!(news.iter().all(|a| a.summary.chars().count() <= 153));
}

#[tokio::test]
async fn general_feed_failure_is_a_generic_error() {
    let server = setup_server();
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/news");
        then.status(429).body("API limit reached");
    });
    let client = client_for(&server);

    let err = NewsBuilder::new(&client).fetch().await.unwrap_err();
    assert!(matches!(err, FinnhubError::NewsUnavailable));
    assert_eq!(err.to_string(), "Failed to fetch news");
}

#[tokio::test]
async fn missing_key_raises_without_touching_the_network() {
    let server = setup_server();
    let general = mock_general_news(&server, json!([article(1, "x", T0)]));
    let client = FinnhubClient::builder()
        .base_url(url::Url::parse(&format!("{}/api/v1/", server.base_url())).unwrap())
        .build()
        .unwrap();

    let err = signalist::get_news(&client, ["AAPL"]).await.unwrap_err();

    assert!(matches!(err, FinnhubError::NewsUnavailable));
    general.assert_calls(0);
}

#[tokio::test]
async fn company_news_is_cached_for_five_minutes() {
    let server = setup_server();
    let mock = mock_company_news(&server, "AAPL", articles(100, 3));
    let clock = ManualClock::new();
    let client = client_with_clock(&server, Arc::new(clock.clone()));
    let fetch = || {
        NewsBuilder::new(&client)
            .symbols(["AAPL"])
            .as_of(as_of())
            .fetch()
    };

    let first = fetch().await.unwrap();
    clock.advance(Duration::from_secs(299));
    let second = fetch().await.unwrap();
    mock.assert_calls(1);
    assert_eq!(first, second);

    clock.advance(Duration::from_secs(1));
    fetch().await.unwrap();
    mock.assert_calls(2);
}
