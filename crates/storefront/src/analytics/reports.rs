//! Client-side error reports.
//!
//! Browsers post loosely shaped JSON; [`ErrorReport::sanitize`] coerces it
//! into bounded fields before anything is logged, captured to Sentry or
//! forwarded to the configured webhook.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::clicks::truncate_chars;

const MESSAGE_CHARS: usize = 500;
const STACK_CHARS: usize = 2000;
const ROUTE_CHARS: usize = 200;
const USER_AGENT_CHARS: usize = 500;
const SESSION_CHARS: usize = 100;
const BUILD_VERSION_CHARS: usize = 50;
const ERROR_ID_SUFFIX: usize = 9;
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Error message is required")]
    MissingMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportSeverity {
    fn parse(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("low") => Self::Low,
            Some("high") => Self::High,
            Some("critical") => Self::Critical,
            _ => Self::Medium,
        }
    }

    const fn sentry_level(self) -> sentry::Level {
        match self {
            Self::Low => sentry::Level::Info,
            Self::Medium => sentry::Level::Warning,
            Self::High => sentry::Level::Error,
            Self::Critical => sentry::Level::Fatal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Network,
    Validation,
    Shopify,
    Runtime,
    Ui,
    Checkout,
}

impl ReportCategory {
    fn parse(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("network") => Self::Network,
            Some("validation") => Self::Validation,
            Some("shopify") => Self::Shopify,
            Some("ui") => Self::Ui,
            Some("checkout") => Self::Checkout,
            _ => Self::Runtime,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::Shopify => "shopify",
            Self::Runtime => "runtime",
            Self::Ui => "ui",
            Self::Checkout => "checkout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedError {
    pub message: String,
    pub stack: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportContext {
    pub route: String,
    pub user_agent: String,
    pub timestamp: String,
    pub session_id: String,
    pub build_version: String,
}

/// `parent[key]`, when both exist.
fn field<'v>(parent: Option<&'v Value>, key: &str) -> Option<&'v Value> {
    parent.and_then(|p| p.get(key))
}

/// A sanitized error report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: ReportedError,
    pub context: ReportContext,
    pub severity: ReportSeverity,
    pub category: ReportCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ErrorReport {
    /// Build a bounded report from an arbitrary JSON body.
    ///
    /// # Errors
    ///
    /// `InvalidBody` when the body isn't an object, `MissingMessage` when
    /// `error.message` is empty after coercion.
    pub fn sanitize(body: &Value) -> Result<Self, ReportError> {
        if !body.is_object() {
            return Err(ReportError::InvalidBody);
        }

        let error = body.get("error");
        let context = body.get("context");

        let message = truncate_chars(&coerce(field(error, "message")), MESSAGE_CHARS);
        if message.is_empty() {
            return Err(ReportError::MissingMessage);
        }

        let name = coerce(field(error, "name"));
        let timestamp = coerce(field(context, "timestamp"));

        Ok(Self {
            error: ReportedError {
                message,
                stack: truncate_chars(&coerce(field(error, "stack")), STACK_CHARS),
                name: if name.is_empty() { "Error".to_string() } else { name },
            },
            context: ReportContext {
                route: truncate_chars(&coerce(field(context, "route")), ROUTE_CHARS),
                user_agent: truncate_chars(&coerce(field(context, "userAgent")), USER_AGENT_CHARS),
                timestamp: if timestamp.is_empty() {
                    chrono::Utc::now().to_rfc3339()
                } else {
                    timestamp
                },
                session_id: truncate_chars(&coerce(field(context, "sessionId")), SESSION_CHARS),
                build_version: truncate_chars(
                    &coerce(field(context, "buildVersion")),
                    BUILD_VERSION_CHARS,
                ),
            },
            severity: ReportSeverity::parse(body.get("severity")),
            category: ReportCategory::parse(body.get("category")),
            metadata: body.get("metadata").filter(|m| !m.is_null()).cloned(),
        })
    }
}

/// Stringify a JSON value the way a browser would; missing and null are empty.
fn coerce(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `api_<unix millis>_<9 lowercase alphanumerics>`.
#[must_use]
pub fn generate_error_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..ERROR_ID_SUFFIX)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|b| char::from(*b))
        .collect();
    format!("api_{}_{suffix}", chrono::Utc::now().timestamp_millis())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    report: &'a ErrorReport,
    error_id: &'a str,
}

/// Fans sanitized reports out to tracing, Sentry and the optional webhook.
#[derive(Clone)]
pub struct ErrorReporter {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl ErrorReporter {
    #[must_use]
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// Record a report and return its id. Forwarding failures are logged,
    /// never surfaced.
    pub async fn submit(&self, report: &ErrorReport) -> String {
        let error_id = generate_error_id();

        tracing::warn!(
            error_id = %error_id,
            severity = ?report.severity,
            category = report.category.as_str(),
            route = %report.context.route,
            message = %report.error.message,
            "Client error report"
        );

        sentry::with_scope(
            |scope| {
                scope.set_tag("category", report.category.as_str());
                scope.set_tag("error_id", &error_id);
                scope.set_extra(
                    "context",
                    serde_json::to_value(&report.context).unwrap_or_default(),
                );
                if let Some(metadata) = &report.metadata {
                    scope.set_extra("metadata", metadata.clone());
                }
            },
            || sentry::capture_message(&report.error.message, report.severity.sentry_level()),
        );

        if let Some(url) = &self.webhook_url {
            let payload = WebhookPayload {
                report,
                error_id: &error_id,
            };
            let result = self
                .http
                .post(url)
                .timeout(WEBHOOK_TIMEOUT)
                .json(&payload)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);
            if let Err(e) = result {
                tracing::warn!(error_id = %error_id, error = %e, "Failed to forward error report");
            }
        }

        error_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_sanitize_full_report() {
        let report = ErrorReport::sanitize(&json!({
            "error": { "message": "Cart failed", "stack": "at add()", "name": "TypeError" },
            "context": {
                "route": "/cart",
                "userAgent": "Mozilla/5.0",
                "timestamp": "2024-03-01T10:00:00Z",
                "sessionId": "s1",
                "buildVersion": "1.4.2"
            },
            "severity": "critical",
            "category": "checkout",
            "metadata": { "lines": 2 }
        }))
        .unwrap();

        assert_eq!(report.error.name, "TypeError");
        assert_eq!(report.context.timestamp, "2024-03-01T10:00:00Z");
        assert_eq!(report.severity, ReportSeverity::Critical);
        assert_eq!(report.category, ReportCategory::Checkout);
        assert_eq!(report.metadata, Some(json!({ "lines": 2 })));
    }

    #[test]
    fn test_sanitize_defaults_and_limits() {
        let report = ErrorReport::sanitize(&json!({
            "error": { "message": "x".repeat(800), "stack": "y".repeat(5000) },
            "context": { "route": "r".repeat(300), "sessionId": 42 },
            "severity": "catastrophic",
            "category": "cosmic"
        }))
        .unwrap();

        assert_eq!(report.error.message.len(), MESSAGE_CHARS);
        assert_eq!(report.error.stack.len(), STACK_CHARS);
        assert_eq!(report.error.name, "Error");
        assert_eq!(report.context.route.len(), ROUTE_CHARS);
        assert_eq!(report.context.session_id, "42");
        assert!(!report.context.timestamp.is_empty());
        assert_eq!(report.severity, ReportSeverity::Medium);
        assert_eq!(report.category, ReportCategory::Runtime);
        assert!(report.metadata.is_none());
    }

    #[test]
    fn test_sanitize_rejects_bad_input() {
        assert_eq!(ErrorReport::sanitize(&json!("boom")), Err(ReportError::InvalidBody));
        assert_eq!(
            ErrorReport::sanitize(&json!({ "error": {} })),
            Err(ReportError::MissingMessage)
        );
        assert_eq!(ErrorReport::sanitize(&json!({})), Err(ReportError::MissingMessage));
    }

    #[test]
    fn test_error_id_format() {
        let id = generate_error_id();
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "api");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ERROR_ID_SUFFIX);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_submit_forwards_to_webhook() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJson(json!({
                "error": { "message": "Cart failed" },
                "category": "checkout"
            })))
            .with_status(204)
            .create_async()
            .await;

        let reporter = ErrorReporter::new(Some(format!("{}/hook", server.url())));
        let report = ErrorReport::sanitize(&json!({
            "error": { "message": "Cart failed" },
            "category": "checkout"
        }))
        .unwrap();

        let id = reporter.submit(&report).await;
        assert!(id.starts_with("api_"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_survives_webhook_failure() {
        let reporter = ErrorReporter::new(Some("http://127.0.0.1:9/unreachable".to_string()));
        let report = ErrorReport::sanitize(&json!({ "error": { "message": "x" } })).unwrap();
        assert!(reporter.submit(&report).await.starts_with("api_"));
    }
}
