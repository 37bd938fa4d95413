use std::sync::Arc;

use httpmock::Method::GET;
use serde_json::json;
use signalist::core::BodyCache;
use signalist::{CacheMode, SearchBuilder, TtlCache};

use crate::common::{builder_for, client_for, mock_search, setup_server};

fn one_hit() -> serde_json::Value {
    json!({ "result": [{ "symbol": "AAPL", "description": "Apple Inc", "type": "Common Stock" }] })
}

#[tokio::test]
async fn refresh_skips_the_read_but_stores_the_result() {
    let server = setup_server();
    let mock = mock_search(&server, "apple", one_hit());
    let client = client_for(&server);

    SearchBuilder::new(&client, "apple").fetch().await;
    SearchBuilder::new(&client, "apple")
        .cache_mode(CacheMode::Refresh)
        .fetch()
        .await;
    mock.assert_calls(2);

    SearchBuilder::new(&client, "apple").fetch().await;
    mock.assert_calls(2);
}

#[tokio::test]
async fn bypass_neither_reads_nor_writes() {
    let server = setup_server();
    let mock = mock_search(&server, "apple", one_hit());
    let client = client_for(&server);

    let results = SearchBuilder::new(&client, "apple")
        .cache_mode(CacheMode::Bypass)
        .fetch()
        .await;
    assert_eq!(results.len(), 1);
    assert!(client.cache().is_empty().await);

    SearchBuilder::new(&client, "apple").fetch().await;
    mock.assert_calls(2);
}

#[tokio::test]
async fn clients_can_share_one_cache() {
    let server = setup_server();
    let mock = mock_search(&server, "apple", one_hit());
    let cache: Arc<BodyCache> = Arc::new(TtlCache::new(16));
    let a = builder_for(&server).cache(cache.clone()).build().unwrap();
    let b = builder_for(&server).cache(cache.clone()).build().unwrap();

    SearchBuilder::new(&a, "apple").fetch().await;
    SearchBuilder::new(&b, "apple").fetch().await;

    mock.assert_calls(1);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn clients_with_different_keys_share_bodies_through_one_cache() {
    let server = setup_server();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/v1/search").query_param("q", "apple");
        then.status(200).json_body(one_hit());
    });
    let cache: Arc<BodyCache> = Arc::new(TtlCache::new(16));
    let a = builder_for(&server).cache(cache.clone()).build().unwrap();
    let b = builder_for(&server)
        .api_key("second-key")
        .cache(cache.clone())
        .build()
        .unwrap();

    let from_a = SearchBuilder::new(&a, "apple").fetch().await;
    let from_b = SearchBuilder::new(&b, "apple").fetch().await;

    mock.assert_calls(1);
    assert_eq!(from_a, from_b);
}

#[tokio::test]
async fn cache_key_does_not_carry_the_token() {
    let server = setup_server();
    mock_search(&server, "apple", one_hit());
    let client = client_for(&server);

    SearchBuilder::new(&client, "apple").fetch().await;

    let key = format!("{}/api/v1/search?q=apple", server.base_url());
    assert!(client.cache().get(&key).await.is_some());
    assert!(!client.cache().invalidate(&format!("{key}&token=test-token")).await);
    assert!(client.cache().invalidate(&key).await);
}
