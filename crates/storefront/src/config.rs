//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., alltagsgold.myshopify.com)
//! - `SHOPIFY_STOREFRONT_TOKEN` - Storefront API access token
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `SHOPIFY_API_VERSION` - API version (default: 2023-10)
//! - `SHOPIFY_CACHE_TTL_SECS` - Fresh response lifetime (default: 300)
//! - `SHOPIFY_STALE_TTL_SECS` - How long stale responses are kept as fallback (default: 86400)
//! - `SHOPIFY_MAX_RETRIES` - Retries after the first attempt (default: 3)
//! - `SHOPIFY_TIMEOUT_MS` - First-attempt timeout, grows linearly per attempt (default: 5000)
//! - `SHOPIFY_BACKOFF_MIN_MS` / `SHOPIFY_BACKOFF_MAX_MS` - Backoff bounds (default: 500 / 10000)
//! - `PRODUCT_CACHE_CAPACITY` / `PRODUCT_CACHE_TTL_SECS` - Product cache (default: 100 / 600)
//! - `CLICK_BATCH_SIZE` / `CLICK_FLUSH_INTERVAL_MS` / `CLICK_STORE_CAPACITY` - Click buffering
//!   (default: 10 / 5000 / 1000)
//! - `CLICK_SESSION_CAPACITY` - Session ids counted for unique sessions (default: 10000)
//! - `CLOUDINARY_CLOUD_NAME` - Enables image URL rewriting
//! - `REVALIDATE_SECRET` - Shared secret for manual revalidation
//! - `SHOPIFY_WEBHOOK_SECRET` - HMAC key for Shopify webhooks
//! - `ERROR_WEBHOOK_URL` - Forward error reports to this URL
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::shopify::RetryPolicy;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_API_VERSION: &str = "2023-10";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Retry behaviour for Storefront API calls
    pub retry: RetryPolicy,
    /// Cache lifetimes and sizes
    pub cache: CacheConfig,
    /// Click buffering
    pub clicks: ClickConfig,
    /// Cloudinary cloud name; `None` disables image rewriting
    pub cloudinary_cloud_name: Option<String>,
    /// Shared secret for `/api/revalidate`
    pub revalidate_secret: Option<SecretString>,
    /// HMAC key for Shopify webhook signatures
    pub webhook_secret: Option<SecretString>,
    /// Forward sanitized error reports here
    pub error_webhook_url: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain, or a full base URL (`http://127.0.0.1:1234`)
    pub store: String,
    /// Shopify API version (e.g., 2023-10)
    pub api_version: String,
    /// Storefront API access token
    pub storefront_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("storefront_token", &"[REDACTED]")
            .finish()
    }
}

impl ShopifyStorefrontConfig {
    /// Create a configuration for the default API version.
    #[must_use]
    pub fn new(store: impl Into<String>, storefront_token: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            storefront_token: SecretString::from(storefront_token.into()),
        }
    }

    /// GraphQL endpoint for this store.
    ///
    /// A bare domain gets `https://`; a value that already carries a scheme
    /// is used as the base URL as-is.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let base = self.store.trim_end_matches('/');
        if base.contains("://") {
            format!("{base}/api/{}/graphql.json", self.api_version)
        } else {
            format!("https://{base}/api/{}/graphql.json", self.api_version)
        }
    }
}

/// Cache lifetimes and sizes.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a Storefront API response is served without refetching
    pub response_ttl: Duration,
    /// How long a response is retained as a fallback after it went stale
    pub stale_ttl: Duration,
    /// Maximum number of cached Storefront API responses
    pub response_capacity: u64,
    /// Maximum number of products in the product cache
    pub product_capacity: usize,
    /// Product cache entry lifetime
    pub product_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            response_ttl: Duration::from_secs(300),
            stale_ttl: Duration::from_secs(86_400),
            response_capacity: 2_000,
            product_capacity: 100,
            product_ttl: Duration::from_secs(600),
        }
    }
}

/// Click buffering configuration.
#[derive(Debug, Clone)]
pub struct ClickConfig {
    /// Flush once this many clicks are buffered
    pub batch_size: usize,
    /// Flush this long after the first buffered click
    pub flush_interval: Duration,
    /// Number of clicks retained for the summary endpoint
    pub store_capacity: usize,
    /// Session ids remembered for the unique-session count
    pub session_capacity: usize,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            flush_interval: Duration::from_secs(5),
            store_capacity: 1_000,
            session_capacity: 10_000,
        }
    }
}

impl StorefrontConfig {
    /// Configuration for the given Shopify store with every optional
    /// setting at its default.
    #[must_use]
    pub fn new(shopify: ShopifyStorefrontConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            shopify,
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
            clicks: ClickConfig::default(),
            cloudinary_cloud_name: None,
            revalidate_secret: None,
            webhook_secret: None,
            error_webhook_url: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        check_http_url("STOREFRONT_BASE_URL", &base_url)?;

        let shopify = ShopifyStorefrontConfig::from_env()?;

        let retry = RetryPolicy {
            max_retries: parse_env("SHOPIFY_MAX_RETRIES", "3")?,
            base_timeout: Duration::from_millis(parse_env("SHOPIFY_TIMEOUT_MS", "5000")?),
            min_delay: Duration::from_millis(parse_env("SHOPIFY_BACKOFF_MIN_MS", "500")?),
            max_delay: Duration::from_millis(parse_env("SHOPIFY_BACKOFF_MAX_MS", "10000")?),
        };

        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            response_ttl: Duration::from_secs(parse_env("SHOPIFY_CACHE_TTL_SECS", "300")?),
            stale_ttl: Duration::from_secs(parse_env("SHOPIFY_STALE_TTL_SECS", "86400")?),
            response_capacity: defaults.response_capacity,
            product_capacity: parse_env("PRODUCT_CACHE_CAPACITY", "100")?,
            product_ttl: Duration::from_secs(parse_env("PRODUCT_CACHE_TTL_SECS", "600")?),
        };

        let clicks = ClickConfig {
            batch_size: parse_env("CLICK_BATCH_SIZE", "10")?,
            flush_interval: Duration::from_millis(parse_env("CLICK_FLUSH_INTERVAL_MS", "5000")?),
            store_capacity: parse_env("CLICK_STORE_CAPACITY", "1000")?,
            session_capacity: parse_env("CLICK_SESSION_CAPACITY", "10000")?,
        };
        if clicks.batch_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CLICK_BATCH_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            shopify,
            retry,
            cache,
            clicks,
            cloudinary_cloud_name: get_optional_env("CLOUDINARY_CLOUD_NAME"),
            revalidate_secret: get_optional_secret("REVALIDATE_SECRET")?,
            webhook_secret: get_optional_secret("SHOPIFY_WEBHOOK_SECRET")?,
            error_webhook_url: get_optional_url("ERROR_WEBHOOK_URL")?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyStorefrontConfig {
    /// Load only the Shopify settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store or token is missing or the token
    /// looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            storefront_token: get_validated_secret("SHOPIFY_STOREFRONT_TOKEN")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an optional environment variable that must be an http(s) URL.
fn get_optional_url(key: &str) -> Result<Option<String>, ConfigError> {
    get_optional_env(key)
        .map(|raw| check_http_url(key, &raw).map(|()| raw))
        .transpose()
}

fn check_http_url(key: &str, raw: &str) -> Result<(), ConfigError> {
    let url = url::Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if matches!(url.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ))
    }
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a required secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Load and validate a secret that may be absent.
fn get_optional_secret(key: &str) -> Result<Option<SecretString>, ConfigError> {
    get_optional_env(key)
        .map(|value| {
            validate_secret_strength(&value, key)?;
            Ok(SecretString::from(value))
        })
        .transpose()
}

/// Whether a configured secret matches `candidate`.
#[must_use]
pub fn secret_matches(secret: &SecretString, candidate: &str) -> bool {
    let expected = secret.expose_secret().as_bytes();
    let candidate = candidate.as_bytes();
    expected.len() == candidate.len()
        && expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-storefront-token", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_accepts_storefront_token() {
        // Shape of a real Storefront API token: 32 hex characters
        let result = validate_secret_strength("9f4c1e07b28d6a35c0e7f1d94b2a8c63", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_value() {
        let retries: usize = parse_value("SHOPIFY_MAX_RETRIES", " 5 ").unwrap();
        assert_eq!(retries, 5);

        let err = parse_value::<u16>("STOREFRONT_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_endpoint_for_domain_and_url() {
        let config = ShopifyStorefrontConfig::new("alltagsgold.myshopify.com", "token");
        assert_eq!(
            config.endpoint(),
            "https://alltagsgold.myshopify.com/api/2023-10/graphql.json"
        );

        let local = ShopifyStorefrontConfig::new("http://127.0.0.1:4010/", "token");
        assert_eq!(
            local.endpoint(),
            "http://127.0.0.1:4010/api/2023-10/graphql.json"
        );
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::new(ShopifyStorefrontConfig::new("s", "t"));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.cache.product_capacity, 100);
        assert_eq!(config.cache.product_ttl, Duration::from_secs(600));
        assert_eq!(config.clicks.batch_size, 10);
        assert_eq!(config.clicks.flush_interval, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_shopify_config_debug_redacts_token() {
        let config = ShopifyStorefrontConfig::new("test.myshopify.com", "super_secret_token");
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("test.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }

    #[test]
    fn test_check_http_url() {
        assert!(check_http_url("ERROR_WEBHOOK_URL", "https://hooks.example.ch/errors").is_ok());
        assert!(check_http_url("ERROR_WEBHOOK_URL", "ftp://files.example.ch").is_err());
        assert!(check_http_url("STOREFRONT_BASE_URL", "not a url").is_err());
    }

    #[test]
    fn test_secret_matches() {
        let secret = SecretString::from("s3cr3t-value");
        assert!(secret_matches(&secret, "s3cr3t-value"));
        assert!(!secret_matches(&secret, "s3cr3t-valuE"));
        assert!(!secret_matches(&secret, "short"));
    }
}
