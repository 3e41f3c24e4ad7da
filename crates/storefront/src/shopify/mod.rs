//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - GraphQL documents live in `graphql/storefront/` and are sent through
//!   `graphql_client` request/response envelopes
//! - Shopify is source of truth - NO local sync, direct API calls
//! - Transient failures are retried with exponential backoff (`backon`)
//! - Responses are cached in-memory via `moka`; a stale copy is kept as a
//!   fallback for when Shopify is unreachable
//!
//! # Example
//!
//! ```rust,ignore
//! use alltagsgold_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify, config.retry, &config.cache);
//!
//! let product = client.get_product_by_handle("bambus-zahnbuerste").await?;
//!
//! let cart = client.create_cart(vec![CartLineInput {
//!     merchandise_id: product.variants[0].id.clone(),
//!     quantity: 1,
//! }]).await?;
//! ```

mod retry;
mod stats;
mod storefront;
pub mod types;

pub use retry::RetryPolicy;
pub use stats::{PerformanceMonitor, PerformanceStats};
pub use storefront::{ResponseCache, StorefrontClient};
pub use types::*;

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The attempt exceeded its timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Shopify answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status code.
        status: u16,
        /// First part of the response body.
        body: String,
    },

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// No storefront access token configured.
    #[error("Shopify credentials are not configured")]
    MissingCredentials,
}

impl ShopifyError {
    /// Whether another attempt could succeed.
    ///
    /// Timeouts, 429s, 5xx responses and connection failures are transient.
    /// Everything else (4xx, GraphQL errors, bad data, missing credentials)
    /// fails the same way on every attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request() || e.is_body(),
            Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::GraphQL(_)
            | Self::Parse(_)
            | Self::NotFound(_)
            | Self::UserError(_)
            | Self::MissingCredentials => false,
        }
    }

    /// Classify the error for reporting and user-facing messages.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited(_) | Self::Status { status: 429, .. } => ErrorKind::RateLimit,
            Self::MissingCredentials | Self::Status { status: 401 | 403, .. } => {
                ErrorKind::Authentication
            }
            Self::Http(_) | Self::Timeout(_) => ErrorKind::Network,
            Self::Status { status, .. } if *status >= 500 => ErrorKind::Network,
            Self::UserError(message) => {
                ErrorKind::from_message(message).unwrap_or(ErrorKind::Validation)
            }
            Self::GraphQL(errors) => errors
                .iter()
                .find_map(|e| ErrorKind::from_message(&e.message))
                .unwrap_or(ErrorKind::Validation),
            Self::Parse(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::Status { .. } => ErrorKind::Unknown,
        }
    }
}

/// Error category used for reporting and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimit,
    Inventory,
    Checkout,
    Authentication,
    Network,
    Validation,
    Unknown,
}

/// How urgent an error is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorKind {
    /// Inventory and checkout problems surface as text in user errors.
    fn from_message(message: &str) -> Option<Self> {
        let message = message.to_lowercase();
        if ["inventory", "stock", "available"]
            .iter()
            .any(|k| message.contains(k))
        {
            Some(Self::Inventory)
        } else if ["checkout", "payment", "cart"]
            .iter()
            .any(|k| message.contains(k))
        {
            Some(Self::Checkout)
        } else if ["unauthorized", "token", "access denied"]
            .iter()
            .any(|k| message.contains(k))
        {
            Some(Self::Authentication)
        } else if message.contains("throttle") || message.contains("rate limit") {
            Some(Self::RateLimit)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Validation => Severity::Low,
            Self::RateLimit | Self::Network | Self::Unknown => Severity::Medium,
            Self::Inventory | Self::Authentication => Severity::High,
            Self::Checkout => Severity::Critical,
        }
    }

    /// Whether the caller can expect the operation to work later.
    #[must_use]
    pub const fn recoverable(self) -> bool {
        matches!(
            self,
            Self::RateLimit | Self::Checkout | Self::Network | Self::Unknown
        )
    }

    /// Message shown to shoppers.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::RateLimit => {
                "Service vorübergehend überlastet. Bitte versuchen Sie es später erneut."
            }
            Self::Inventory => "Artikel ist leider nicht mehr verfügbar",
            Self::Checkout => "Checkout konnte nicht abgeschlossen werden",
            Self::Network => "Verbindungsproblem. Bitte versuchen Sie es erneut.",
            Self::Authentication | Self::Validation | Self::Unknown => {
                "Ein unerwarteter Fehler ist aufgetreten"
            }
        }
    }
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone, Serialize)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        Self {
            message: e.message,
            locations: e.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: e.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

impl GraphQLError {
    /// An error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("products".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: products.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = ShopifyError::GraphQL(vec![GraphQLError::message("")]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ShopifyError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(ShopifyError::RateLimited(2).is_retryable());
        assert!(
            ShopifyError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(
            !ShopifyError::Status {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ShopifyError::GraphQL(vec![]).is_retryable());
        assert!(!ShopifyError::MissingCredentials.is_retryable());
        assert!(!ShopifyError::UserError("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_classification() {
        assert_eq!(ShopifyError::RateLimited(1).kind(), ErrorKind::RateLimit);
        assert_eq!(
            ShopifyError::MissingCredentials.kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            ShopifyError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Network
        );
        assert_eq!(
            ShopifyError::UserError("Only 2 items available in stock".to_string()).kind(),
            ErrorKind::Inventory
        );
        assert_eq!(
            ShopifyError::UserError("The specified cart does not exist".to_string()).kind(),
            ErrorKind::Checkout
        );
        assert_eq!(
            ShopifyError::GraphQL(vec![GraphQLError::message("Field 'x' doesn't exist")]).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ShopifyError::NotFound("x".to_string()).kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_severity_and_recoverability() {
        assert_eq!(ErrorKind::Checkout.severity(), Severity::Critical);
        assert_eq!(ErrorKind::Validation.severity(), Severity::Low);
        assert!(ErrorKind::Network.recoverable());
        assert!(!ErrorKind::Inventory.recoverable());
        assert!(!ErrorKind::Authentication.recoverable());
        assert!(Severity::Critical > Severity::High);
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
