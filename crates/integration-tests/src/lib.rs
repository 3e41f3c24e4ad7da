//! Integration tests for the Alltagsgold storefront.
//!
//! The full router runs in-process against a `mockito` server standing in
//! for the Shopify Storefront API, so no network access or credentials are
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p alltagsgold-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::time::Duration;

use alltagsgold_storefront::config::{ShopifyStorefrontConfig, StorefrontConfig};
use alltagsgold_storefront::routes;
use alltagsgold_storefront::shopify::RetryPolicy;
use alltagsgold_storefront::state::AppState;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Storefront token the mock server expects.
pub const TOKEN: &str = "9f4c1e07b28d6a35c0e7f1d94b2a8c63";

/// Secret for `/api/revalidate`.
pub const REVALIDATE_SECRET: &str = "q8Zr2mVx7KpL4nTw";

/// Shopify GraphQL path on the mock server.
pub const ENDPOINT: &str = "/api/2023-10/graphql.json";

/// Client address every test request claims, for the rate limiters.
const CLIENT_IP: &str = "203.0.113.10";

/// A running app plus the mock Shopify behind it.
pub struct TestContext {
    pub shopify: mockito::ServerGuard,
    pub state: AppState,
    app: Router,
}

/// Status, headers and body of one response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    /// Body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).expect("response body is JSON")
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie, ready for a `Cookie` header.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|c| c.starts_with("ag_session="))
            .and_then(|c| c.split(';').next())
            .map(str::to_string)
    }
}

impl TestContext {
    /// Default test configuration: no retries, revalidation enabled.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Test configuration adjusted by `configure` before the app starts.
    pub async fn with_config(configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let shopify = mockito::Server::new_async().await;

        let mut config = StorefrontConfig::new(ShopifyStorefrontConfig::new(shopify.url(), TOKEN));
        config.retry = RetryPolicy {
            max_retries: 0,
            base_timeout: Duration::from_secs(2),
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        config.revalidate_secret = Some(SecretString::from(REVALIDATE_SECRET));
        configure(&mut config);

        let state = AppState::new(config);
        let app = routes::app(state.clone());
        Self {
            shopify,
            state,
            app,
        }
    }

    /// Mock one Shopify operation by its GraphQL operation name.
    pub async fn mock_operation(&mut self, operation: &str, data: Value) -> mockito::Mock {
        self.shopify
            .mock("POST", ENDPOINT)
            .match_body(mockito::Matcher::PartialJson(
                json!({ "operationName": operation }),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "data": data }).to_string())
            .create_async()
            .await
    }

    /// Send a request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");

        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(request("GET", uri).body(Body::empty()).expect("valid request"))
            .await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> TestResponse {
        self.send(
            request("GET", uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.post_json_with_cookie(uri, body, None).await
    }

    pub async fn post_json_with_cookie(
        &self,
        uri: &str,
        body: &Value,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = request("POST", uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(
            builder
                .body(Body::from(body.to_string()))
                .expect("valid request"),
        )
        .await
    }
}

/// Request builder with the client address header set.
#[must_use]
pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", CLIENT_IP)
}

/// Storefront API product node.
#[must_use]
pub fn product_json(handle: &str, amount: &str) -> Value {
    let price = json!({ "amount": amount, "currencyCode": "CHF" });
    json!({
        "id": format!("gid://shopify/Product/{}", handle.len()),
        "handle": handle,
        "title": handle.to_uppercase(),
        "description": "",
        "descriptionHtml": "",
        "availableForSale": true,
        "vendor": "Alltagsgold",
        "productType": "Haushalt",
        "tags": [],
        "options": [],
        "featuredImage": {
            "url": format!("https://cdn.shopify.com/s/files/1/{handle}.jpg"),
            "altText": null
        },
        "images": { "edges": [] },
        "priceRange": { "minVariantPrice": price, "maxVariantPrice": price },
        "variants": { "edges": [ { "node": {
            "id": format!("gid://shopify/ProductVariant/{}", handle.len()),
            "title": "Default Title",
            "availableForSale": true,
            "price": price,
            "selectedOptions": []
        } } ] },
        "collections": { "edges": [] }
    })
}

/// Storefront API cart with one line of `quantity` items at CHF 19.90,
/// `total` being the line and cart total.
#[must_use]
pub fn cart_json(id: &str, quantity: i64, total: &str) -> Value {
    let unit = json!({ "amount": "19.90", "currencyCode": "CHF" });
    let total = json!({ "amount": total, "currencyCode": "CHF" });
    json!({
        "id": id,
        "checkoutUrl": "https://alltagsgold.ch/cart/c/checkout-1",
        "createdAt": "2026-10-01T08:00:00Z",
        "updatedAt": "2026-10-01T08:00:00Z",
        "note": null,
        "totalQuantity": quantity,
        "cost": { "subtotalAmount": total, "totalAmount": total },
        "discountCodes": [],
        "lines": { "edges": [ { "node": {
            "id": "gid://shopify/CartLine/1",
            "quantity": quantity,
            "cost": {
                "amountPerQuantity": unit,
                "subtotalAmount": total,
                "totalAmount": total
            },
            "merchandise": {
                "id": "gid://shopify/ProductVariant/5",
                "title": "Default Title",
                "availableForSale": true,
                "price": unit,
                "selectedOptions": [],
                "product": {
                    "id": "gid://shopify/Product/5",
                    "handle": "honig",
                    "title": "HONIG",
                    "vendor": "Alltagsgold"
                }
            }
        } } ] }
    })
}
