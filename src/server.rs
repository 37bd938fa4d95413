//! JSON HTTP surface consumed by the dashboard frontend.

use std::sync::Arc;

use actix_web::{
    HttpRequest, HttpResponse, ResponseError, get,
    http::{Method, StatusCode},
    middleware::DefaultHeaders,
    web,
};
use serde::Deserialize;
use thiserror::Error;

use crate::core::FinnhubClient;
use crate::news::{MarketNewsArticle, NewsBuilder};
use crate::search::{StockWithWatchlistStatus, search_stocks};
use crate::watchlist::{WatchlistStore, mark_watched};

pub struct AppState {
    pub finnhub: FinnhubClient,
    pub watchlists: Arc<dyn WatchlistStore>,
}

impl AppState {
    pub fn new(finnhub: FinnhubClient, watchlists: Arc<dyn WatchlistStore>) -> Self {
        Self { finnhub, watchlists }
    }
}

/// Errors surfaced to HTTP clients as `500 {"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to search stocks")]
    Search,
    #[error("Failed to fetch news")]
    News,
    #[error("Failed to get watchlist")]
    Watchlist,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

/// CORS headers attached to every response, allowing the frontend at `origin`.
pub fn cors_headers(origin: &str) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", origin.to_string()))
        .add(("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization, Cookie"))
        .add(("Access-Control-Allow-Credentials", "true"))
}

/// Registers every route plus the preflight / not-found fallback.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::search)
        .service(routes::news)
        .service(routes::watchlist)
        .service(routes::health)
        .default_service(web::to(fallback));
}

async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::NotFound().body("Not Found")
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// When set, results the user already watches are flagged.
    pub user: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewsParams {
    /// Comma-separated ticker symbols.
    pub symbols: Option<String>,
}

pub mod routes {
    use super::*;

    #[get("/api/stocks/search")]
    pub async fn search(
        app: web::Data<AppState>,
        params: web::Query<SearchParams>,
    ) -> Result<web::Json<Vec<StockWithWatchlistStatus>>, ApiError> {
        let mut results = search_stocks(&app.finnhub, params.q.as_deref()).await;

        if let Some(user) = params.user.as_deref().filter(|u| !u.trim().is_empty()) {
            let watched = app.watchlists.symbols_for(user).await.map_err(|e| {
                tracing::error!(error = %e, "watchlist lookup for search failed");
                ApiError::Search
            })?;
            mark_watched(&mut results, &watched);
        }

        Ok(web::Json(results))
    }

    #[get("/api/news")]
    pub async fn news(
        app: web::Data<AppState>,
        params: web::Query<NewsParams>,
    ) -> Result<web::Json<Vec<MarketNewsArticle>>, ApiError> {
        let symbols = params
            .symbols
            .as_deref()
            .map(|s| s.split(',').map(str::to_string).collect::<Vec<_>>())
            .unwrap_or_default();

        NewsBuilder::new(&app.finnhub)
            .symbols(symbols)
            .fetch()
            .await
            .map(web::Json)
            .map_err(|_| ApiError::News)
    }

    #[get("/api/watchlist/{user_id}")]
    pub async fn watchlist(
        app: web::Data<AppState>,
        path: web::Path<(String,)>,
    ) -> Result<web::Json<Vec<String>>, ApiError> {
        let (user_id,) = path.into_inner();
        app.watchlists
            .symbols_for(&user_id)
            .await
            .map(web::Json)
            .map_err(|e| {
                tracing::error!(error = %e, user = %user_id, "watchlist lookup failed");
                ApiError::Watchlist
            })
    }

    #[get("/health")]
    pub async fn health() -> HttpResponse {
        HttpResponse::Ok().body("OK")
    }
}
