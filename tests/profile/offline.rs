use serde_json::json;
use signalist::fetch_profile;

use crate::common::{client_for, mock_profile, setup_server};

#[tokio::test]
async fn profile_maps_finnhub_field_names() {
    let server = setup_server();
    let mock = mock_profile(
        &server,
        "AAPL",
        json!({
            "country": "US",
            "currency": "USD",
            "exchange": "NASDAQ NMS - GLOBAL MARKET",
            "finnhubIndustry": "Technology",
            "ipo": "1980-12-12",
            "logo": "https://static.example.com/AAPL.png",
            "marketCapitalization": 3_400_000.5,
            "name": "Apple Inc",
            "ticker": "AAPL",
            "weburl": "https://www.apple.com/"
        }),
    );
    let client = client_for(&server);

    let profile = fetch_profile(&client, " aapl ").await.unwrap().unwrap();

    mock.assert();
    assert_eq!(profile.name.as_deref(), Some("Apple Inc"));
    assert_eq!(profile.industry.as_deref(), Some("Technology"));
    assert_eq!(profile.market_cap, Some(3_400_000.5));
}

#[tokio::test]
async fn unknown_symbol_is_none() {
    let server = setup_server();
    mock_profile(&server, "ZZZZ", json!({}));
    let client = client_for(&server);

    assert!(fetch_profile(&client, "ZZZZ").await.unwrap().is_none());
}
