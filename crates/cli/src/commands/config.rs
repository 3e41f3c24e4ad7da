//! Configuration check.
//!
//! Loads the storefront configuration exactly as the server does and
//! reports what is enabled, without printing secrets.

use alltagsgold_storefront::config::{CacheConfig, StorefrontConfig};
use alltagsgold_storefront::shopify::StorefrontClient;
use tracing::info;

/// Validate the environment; with `ping`, run one small catalog query.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the ping fails.
pub async fn check(ping: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;

    info!(
        addr = %config.socket_addr(),
        base_url = %config.base_url,
        store = %config.shopify.store,
        endpoint = %config.shopify.endpoint(),
        "Configuration loaded"
    );
    info!(
        cloudinary = config.cloudinary_cloud_name.is_some(),
        revalidate = config.revalidate_secret.is_some(),
        webhook_hmac = config.webhook_secret.is_some(),
        error_webhook = config.error_webhook_url.is_some(),
        sentry = config.sentry_dsn.is_some(),
        "Optional features"
    );

    if ping {
        let client = StorefrontClient::new(&config.shopify, config.retry, &CacheConfig::default());
        let page = client.get_products(1, None).await?;
        info!(
            products = page.products.len(),
            has_more = page.page_info.has_next_page,
            "Shopify reachable"
        );
    }
    Ok(())
}
