use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use signalist::config::Config;
use signalist::server::{AppState, configure, cors_headers};
use signalist::watchlist::MemoryWatchlistStore;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().map_err(std::io::Error::other)?;
    let finnhub = config.finnhub_client().map_err(std::io::Error::other)?;
    if !finnhub.has_api_key() {
        tracing::warn!("FINNHUB_API_KEY is not set; search will return no results and news will fail");
    }

    let state = web::Data::new(AppState::new(finnhub, Arc::new(MemoryWatchlistStore::new())));
    let origin = config.frontend_origin.clone();

    tracing::info!(host = %config.host, port = config.port, "server starting");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_headers(&origin))
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
