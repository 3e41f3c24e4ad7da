//! Subcommand implementations.

pub mod config;
pub mod image;
pub mod products;

use std::error::Error;

use alltagsgold_storefront::config::{CacheConfig, ShopifyStorefrontConfig};
use alltagsgold_storefront::shopify::{RetryPolicy, StorefrontClient};

/// Storefront client for the store configured in the environment.
///
/// # Errors
///
/// Returns an error if `SHOPIFY_STORE` or `SHOPIFY_STOREFRONT_TOKEN` is
/// missing or invalid.
pub fn client_from_env() -> Result<StorefrontClient, Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let shopify = ShopifyStorefrontConfig::from_env()?;
    Ok(StorefrontClient::new(
        &shopify,
        RetryPolicy::default(),
        &CacheConfig::default(),
    ))
}
