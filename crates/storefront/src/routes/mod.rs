//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (credentials configured)
//!
//! # Catalog
//! GET  /api/products?first&after            - Product listing
//! GET  /api/products/handles                - Every product handle
//! GET  /api/products/{handle}               - Product detail
//! GET  /api/products/{handle}/recommendations
//! GET  /api/collections?first               - Collection listing
//! GET  /api/collections/handles             - Every collection handle
//! GET  /api/collections/{handle}?first&after
//! GET  /api/blogs                           - Blog list
//! GET  /api/blog?first                      - Newest posts
//! GET  /api/blog/{handle}                   - Single post
//!
//! # Cart (session)
//! GET  /api/cart
//! POST /api/cart/add
//! POST /api/cart/update
//! POST /api/cart/remove
//! GET  /checkout                            - Redirect to Shopify checkout
//!
//! # Analytics
//! POST /api/analytics/clicks
//! GET  /api/analytics/clicks
//! POST /api/analytics/web-vitals
//! POST /api/errors                          - Rate limited per IP
//!
//! # Operations
//! POST /api/shopify-proxy                   - Rate limited per IP
//! POST /api/revalidate
//! GET  /api/cache/stats
//! ```

pub mod analytics;
pub mod blog;
pub mod cart;
pub mod collections;
pub mod extract;
pub mod health;
pub mod products;
pub mod proxy;
pub mod revalidate;

use axum::{
    Router,
    body::Body,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware,
    response::Response,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::middleware::{
    create_session_layer, error_report_rate_limiter, proxy_rate_limiter, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Browser and CDN caching for successful catalog responses.
const CATALOG_CACHE_CONTROL: &str = "public, max-age=60, stale-while-revalidate=300";

fn catalog_cache_control(response: &Response) -> Option<HeaderValue> {
    response
        .status()
        .is_success()
        .then(|| HeaderValue::from_static(CATALOG_CACHE_CONTROL))
}

/// Create the catalog routes router (products, collections, blog).
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/handles", get(products::handles))
        .route("/products/{handle}", get(products::show))
        .route(
            "/products/{handle}/recommendations",
            get(products::recommendations),
        )
        .route("/collections", get(collections::index))
        .route("/collections/handles", get(collections::handles))
        .route("/collections/{handle}", get(collections::show))
        .route("/blogs", get(blog::blogs))
        .route("/blog", get(blog::index))
        .route("/blog/{handle}", get(blog::show))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            catalog_cache_control,
        ))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the analytics routes router.
///
/// The click tracker may be embedded on other origins, so these accept
/// cross-origin requests.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/clicks",
            post(analytics::track_click).get(analytics::click_summary),
        )
        .route("/web-vitals", post(analytics::web_vitals))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE]),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", catalog_routes())
        .nest("/api/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        .nest("/api/analytics", analytics_routes())
        .route(
            "/api/errors",
            post(analytics::report_error).layer(error_report_rate_limiter()),
        )
        .route(
            "/api/shopify-proxy",
            post(proxy::forward).layer(proxy_rate_limiter()),
        )
        .route("/api/revalidate", post(revalidate::revalidate))
        .route("/api/cache/stats", get(health::cache_stats))
}

/// The complete application: routes, middleware and state.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .layer(session_layer)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
