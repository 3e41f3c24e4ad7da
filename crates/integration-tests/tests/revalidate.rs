//! Integration tests for webhook and manual cache revalidation.

use alltagsgold_integration_tests::{REVALIDATE_SECRET, TestContext, product_json, request};
use axum::body::Body;
use axum::http::StatusCode;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use serde_json::json;
use sha2::Sha256;

const WEBHOOK_SECRET: &str = "whsec_7b1e94c03a2f58d6";

fn manual_uri() -> String {
    format!("/api/revalidate?secret={REVALIDATE_SECRET}")
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

fn webhook(topic: &str, body: &str, signature: &str) -> axum::http::Request<Body> {
    request("POST", "/api/revalidate")
        .header("authorization", format!("Bearer {REVALIDATE_SECRET}"))
        .header("content-type", "application/json")
        .header("x-shopify-topic", topic)
        .header("x-shopify-hmac-sha256", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_missing_or_wrong_secret_is_unauthorized() {
    let ctx = TestContext::new().await;

    let none = ctx.post_json("/api/revalidate", &json!({})).await;
    assert_eq!(none.status, StatusCode::UNAUTHORIZED);
    assert_eq!(none.json()["error"], "Invalid token");

    let wrong = ctx
        .post_json("/api/revalidate?secret=nope", &json!({}))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unconfigured_secret_rejects_everything() {
    let ctx = TestContext::with_config(|config| config.revalidate_secret = None).await;

    let response = ctx.post_json(&manual_uri(), &json!({})).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Manual revalidation
// =============================================================================

#[tokio::test]
async fn test_manual_product_revalidation_and_duplicate() {
    let ctx = TestContext::new().await;
    let body = json!({ "type": "product", "handle": "honig" });

    let first = ctx.post_json(&manual_uri(), &body).await;
    assert_eq!(first.status, StatusCode::OK);

    let json = first.json();
    assert_eq!(json["revalidated"], true);
    assert_eq!(json["inferred"], json!({ "type": "product", "handle": "honig" }));
    assert_eq!(
        json["paths"],
        json!(["/products", "/collections", "/products/honig"])
    );

    let again = ctx.post_json(&manual_uri(), &body).await;
    assert_eq!(again.status, StatusCode::OK);

    let json = again.json();
    assert_eq!(json["revalidated"], false);
    assert_eq!(json["duplicate"], true);
}

#[tokio::test]
async fn test_revalidation_drops_cached_product() {
    let mut ctx = TestContext::new().await;
    let _mock = ctx
        .mock_operation(
            "GetProductByHandle",
            json!({ "product": product_json("honig", "19.90") }),
        )
        .await;

    ctx.get("/api/products/honig").await;
    assert!(ctx.state.products().get("honig").is_some());

    let response = ctx
        .post_json(&manual_uri(), &json!({ "type": "product", "handle": "honig" }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.json()["invalidated"].as_u64().unwrap() >= 1);
    assert!(ctx.state.products().get("honig").is_none());
}

#[tokio::test]
async fn test_untargeted_revalidation_drops_everything() {
    let mut ctx = TestContext::new().await;
    let _mock = ctx
        .mock_operation(
            "GetProductByHandle",
            json!({ "product": product_json("honig", "19.90") }),
        )
        .await;

    ctx.get("/api/products/honig").await;
    assert!(!ctx.state.products().is_empty());

    let response = ctx.post_json(&manual_uri(), &json!({})).await;
    assert_eq!(response.status, StatusCode::OK);

    let json = response.json();
    assert_eq!(json["paths"], json!(["/products", "/collections"]));
    assert!(json["invalidated"].as_u64().unwrap() >= 1);
    assert!(ctx.state.products().is_empty());
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            request("POST", "/api/revalidate")
                .header("authorization", format!("Bearer {REVALIDATE_SECRET}"))
                .body(Body::from(r#"{"type":"collection","handle":"kueche"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["paths"],
        json!(["/products", "/collections", "/collections/kueche"])
    );
}

// =============================================================================
// Shopify webhooks
// =============================================================================

#[tokio::test]
async fn test_webhook_signature_is_checked() {
    let ctx = TestContext::with_config(|config| {
        config.webhook_secret = Some(SecretString::from(WEBHOOK_SECRET));
    })
    .await;
    let body = r#"{"id":5,"handle":"honig"}"#;

    let forged = ctx
        .send(webhook("products/update", body, &sign(b"something else")))
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged.json()["error"], "Invalid HMAC");

    let genuine = ctx
        .send(webhook("products/update", body, &sign(body.as_bytes())))
        .await;
    assert_eq!(genuine.status, StatusCode::OK);

    let json = genuine.json();
    assert_eq!(json["topic"], "products/update");
    assert_eq!(json["inferred"]["type"], "product");
    assert_eq!(json["inferred"]["handle"], "honig");
}

#[tokio::test]
async fn test_product_create_warms_cache() {
    let mut ctx = TestContext::new().await;
    let _mock = ctx
        .mock_operation(
            "GetProductByHandle",
            json!({ "product": product_json("kerze", "12.90") }),
        )
        .await;

    let body = r#"{"id":9,"handle":"kerze"}"#;
    let response = ctx
        .send(webhook("products/create", body, "unsigned"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["revalidated"], true);

    assert!(ctx.state.products().get("kerze").is_some());
}

#[tokio::test]
async fn test_collection_create_warms_collection() {
    let mut ctx = TestContext::new().await;
    let mock = ctx
        .mock_operation("GetCollectionByHandle", json!({ "collection": null }))
        .await;

    let body = r#"{"id":3,"handle":"kueche"}"#;
    let response = ctx
        .send(webhook("collections/create", body, "unsigned"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["inferred"]["type"], "collection");

    mock.assert_async().await;
}
