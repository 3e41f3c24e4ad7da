//! Application state shared across handlers.

use std::sync::Arc;

use crate::analytics::{ClickBuffer, ErrorReporter};
use crate::config::StorefrontConfig;
use crate::images::ImageOptimizer;
use crate::product_cache::ProductCache;
use crate::revalidate::Revalidator;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and replaces every
/// process-wide singleton: the Storefront client with its response cache,
/// the product cache, the click buffer and the revalidation bookkeeping.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    products: ProductCache,
    clicks: ClickBuffer,
    reporter: ErrorReporter,
    revalidator: Revalidator,
    images: Option<ImageOptimizer>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Spawns the click buffer task, so this must run inside a Tokio runtime.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storefront = StorefrontClient::new(&config.shopify, config.retry, &config.cache);
        let products = ProductCache::from_config(&config.cache);
        let clicks = ClickBuffer::spawn(&config.clicks);
        let reporter = ErrorReporter::new(config.error_webhook_url.clone());
        let revalidator = Revalidator::new(
            config.revalidate_secret.clone(),
            config.webhook_secret.clone(),
        );
        let images = config.cloudinary_cloud_name.clone().map(ImageOptimizer::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                products,
                clicks,
                reporter,
                revalidator,
                images,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    #[must_use]
    pub fn products(&self) -> &ProductCache {
        &self.inner.products
    }

    #[must_use]
    pub fn clicks(&self) -> &ClickBuffer {
        &self.inner.clicks
    }

    #[must_use]
    pub fn reporter(&self) -> &ErrorReporter {
        &self.inner.reporter
    }

    #[must_use]
    pub fn revalidator(&self) -> &Revalidator {
        &self.inner.revalidator
    }

    /// Image rewriter, when Cloudinary is configured.
    #[must_use]
    pub fn images(&self) -> Option<&ImageOptimizer> {
        self.inner.images.as_ref()
    }
}
