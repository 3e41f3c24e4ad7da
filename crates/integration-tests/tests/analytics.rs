//! Integration tests for click tracking, web vitals and client error reports.

use alltagsgold_integration_tests::{TestContext, request};
use axum::body::Body;
use axum::http::StatusCode;
use serde_json::json;

fn click(element: &str, page: &str, session: &str) -> serde_json::Value {
    json!({
        "element": element,
        "text": "In den Warenkorb",
        "position": { "x": 120.0, "y": 480.0 },
        "page": page,
        "timestamp": 1_790_000_000_000_i64,
        "userAgent": "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)",
        "sessionId": session
    })
}

fn report(message: &str) -> serde_json::Value {
    json!({
        "error": { "message": message, "name": "TypeError", "stack": "at render (app.js:1:1)" },
        "context": { "route": "/products/honig", "sessionId": "s-1" },
        "severity": "high",
        "category": "ui"
    })
}

// =============================================================================
// Clicks
// =============================================================================

#[tokio::test]
async fn test_click_missing_fields_is_rejected() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_json("/api/analytics/clicks", &json!({ "element": "button" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Missing required fields");
}

#[tokio::test]
async fn test_mistyped_click_gets_json_error() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_json(
            "/api/analytics/clicks",
            &json!({ "element": 5, "page": "/", "sessionId": "s-1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "Invalid request body");
}

#[tokio::test]
async fn test_clicks_show_up_in_summary_after_flush() {
    let ctx = TestContext::new().await;

    for (element, session) in [("button", "s-1"), ("button", "s-2"), ("a", "s-1")] {
        let response = ctx
            .post_json("/api/analytics/clicks", &click(element, "/", session))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json(), json!({ "success": true }));
    }

    ctx.state.clicks().flush().await;

    let response = ctx.get("/api/analytics/clicks").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalClicks"], 3);
    assert_eq!(body["data"]["uniqueSessions"], 2);
    assert_eq!(body["data"]["topElements"][0]["element"], "button");
    assert_eq!(body["data"]["topElements"][0]["count"], 2);
}

#[tokio::test]
async fn test_full_batch_is_stored_without_flush() {
    let ctx = TestContext::with_config(|config| config.clicks.batch_size = 1).await;

    ctx.post_json("/api/analytics/clicks", &click("img", "/blog", "s-9"))
        .await;
    // Flushing an empty buffer waits for the batch already handed over
    ctx.state.clicks().flush().await;

    assert_eq!(ctx.state.clicks().stored(), 1);
}

#[tokio::test]
async fn test_analytics_allows_cross_origin() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            request("OPTIONS", "/api/analytics/clicks")
                .header("origin", "https://blog.alltagsgold.ch")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response.status.is_success());
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
}

// =============================================================================
// Web vitals
// =============================================================================

#[tokio::test]
async fn test_web_vital_is_accepted() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_json(
            "/api/analytics/web-vitals",
            &json!({ "name": "LCP", "value": 1834.2, "id": "v3-1", "url": "/" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["success"], true);
}

// =============================================================================
// Error reports
// =============================================================================

#[tokio::test]
async fn test_error_report_returns_id() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_json("/api/errors", &report("Cannot read properties of undefined"))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Error reported successfully");
    assert!(body["errorId"].as_str().unwrap().starts_with("api_"));
}

#[tokio::test]
async fn test_error_report_validation() {
    let ctx = TestContext::new().await;

    let not_json = ctx
        .send(
            request("POST", "/api/errors")
                .header("content-type", "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(not_json.status, StatusCode::BAD_REQUEST);
    assert_eq!(not_json.json()["error"], "Invalid request body");

    let no_message = ctx.post_json("/api/errors", &report("")).await;
    assert_eq!(no_message.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_message.json()["error"], "Error message is required");
}

#[tokio::test]
async fn test_error_reports_are_rate_limited() {
    let ctx = TestContext::new().await;

    for _ in 0..10 {
        let response = ctx.post_json("/api/errors", &report("boom")).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let limited = ctx.post_json("/api/errors", &report("boom")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_error_report_forwarded_to_webhook() {
    let mut hooks = mockito::Server::new_async().await;
    let hook = hooks
        .mock("POST", "/hooks/errors")
        .match_body(mockito::Matcher::PartialJson(json!({
            "error": { "message": "Checkout button dead" },
            "category": "ui"
        })))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let url = format!("{}/hooks/errors", hooks.url());
    let ctx = TestContext::with_config(|config| config.error_webhook_url = Some(url)).await;

    let response = ctx
        .post_json("/api/errors", &report("Checkout button dead"))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    hook.assert_async().await;
}
