//! Health and cache introspection endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::product_cache::ProductCacheStats;
use crate::shopify::PerformanceStats;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable until Storefront API credentials are
/// configured.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.storefront().has_credentials() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub api: PerformanceStats,
    pub products: ProductCacheStats,
    pub cached_responses: u64,
    pub stored_clicks: usize,
}

/// API timings plus response and product cache figures.
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(CacheStats {
        api: state.storefront().stats(),
        products: state.products().stats(),
        cached_responses: state.storefront().cached_responses(),
        stored_clicks: state.clicks().stored(),
    })
}
