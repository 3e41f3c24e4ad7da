//! Handler errors and their JSON responses.
//!
//! Every failing handler answers `{"success": false, "error": "..."}`.
//! Upstream failures are sent to Sentry first; client mistakes are not.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::shopify::{Severity, ShopifyError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong secret or signature.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Our own fault; the message is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Shopify(err) => match err {
                ShopifyError::NotFound(_) => StatusCode::NOT_FOUND,
                ShopifyError::UserError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ShopifyError::MissingCredentials => StatusCode::SERVICE_UNAVAILABLE,
                ShopifyError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                ShopifyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// How urgent this is for us; `None` for the client's own mistakes.
    fn severity(&self) -> Option<Severity> {
        match self {
            Self::Internal(_) => Some(Severity::High),
            Self::Shopify(ShopifyError::NotFound(_) | ShopifyError::UserError(_))
            | Self::NotFound(_)
            | Self::Unauthorized(_)
            | Self::BadRequest(_) => None,
            Self::Shopify(err) => Some(err.kind().severity()),
        }
    }

    /// Text for the `error` field.
    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Shopify(ShopifyError::NotFound(what)) => what.clone(),
            Self::Shopify(err) => err.kind().user_message().to_string(),
            Self::NotFound(message) | Self::Unauthorized(message) | Self::BadRequest(message) => {
                message.clone()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(severity) = self.severity() {
            let event_id = sentry::with_scope(
                |scope| {
                    scope.set_level(Some(sentry_level(severity)));
                    if let Self::Shopify(err) = &self {
                        scope.set_tag("recoverable", err.kind().recoverable());
                    }
                },
                || sentry::capture_error(&self),
            );
            if severity >= Severity::High {
                tracing::error!(error = %self, sentry_event_id = %event_id, "Request error");
            } else {
                tracing::warn!(error = %self, sentry_event_id = %event_id, "Request error");
            }
        }

        let mut response = (
            self.status(),
            Json(json!({ "success": false, "error": self.client_message() })),
        )
            .into_response();

        // Pass Shopify's throttle hint on to the browser
        if let Self::Shopify(ShopifyError::RateLimited(seconds)) = &self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(*seconds));
        }

        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        Self::BadRequest("Invalid request body".to_string())
    }
}

const fn sentry_level(severity: Severity) -> sentry::Level {
    match severity {
        Severity::Low => sentry::Level::Info,
        Severity::Medium => sentry::Level::Warning,
        Severity::High | Severity::Critical => sentry::Level::Error,
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Record a shopper action so Sentry events show what led up to them.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases: [(AppError, StatusCode); 9] = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ShopifyError::NotFound("Product not found: x".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                ShopifyError::UserError("Only 1 item available".into()).into(),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ShopifyError::MissingCredentials.into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ShopifyError::Timeout(Duration::from_secs(5)).into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ShopifyError::Status {
                    status: 502,
                    body: String::new(),
                }
                .into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_body_carries_bare_message() {
        let response = AppError::BadRequest("Missing required fields".to_string()).into_response();
        let json = body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn test_internal_details_stay_server_side() {
        let response = AppError::Internal("session store: poisoned".to_string()).into_response();
        assert_eq!(body(response).await["error"], "Internal server error");
    }

    #[test]
    fn test_severity_follows_error_kind() {
        assert_eq!(AppError::BadRequest("x".into()).severity(), None);
        assert_eq!(
            AppError::from(ShopifyError::UserError("Only 1 item available".into())).severity(),
            None
        );
        assert_eq!(
            AppError::from(ShopifyError::RateLimited(3)).severity(),
            Some(Severity::Medium)
        );
        assert_eq!(
            AppError::from(ShopifyError::MissingCredentials).severity(),
            Some(Severity::High)
        );
        assert_eq!(AppError::Internal("x".into()).severity(), Some(Severity::High));

        assert_eq!(sentry_level(Severity::Low), sentry::Level::Info);
        assert_eq!(sentry_level(Severity::Medium), sentry::Level::Warning);
        assert_eq!(sentry_level(Severity::Critical), sentry::Level::Error);
    }

    #[tokio::test]
    async fn test_json_rejection_is_bad_request() {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();

        let response = AppError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(response).await["error"], "Invalid request body");
    }

    #[test]
    fn test_throttled_response_has_retry_after() {
        let response = AppError::from(ShopifyError::RateLimited(7)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "7");
    }
}
