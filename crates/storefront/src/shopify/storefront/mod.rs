//! Shopify Storefront API client implementation.
//!
//! Sends `graphql_client` query bodies with `reqwest` 0.13. Every call goes
//! through [`StorefrontClient::run`]: fresh cache hit, else up to
//! `max_retries + 1` attempts with a growing per-attempt timeout, else the
//! last stale response for transient failures.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use backon::Retryable;
use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::config::{CacheConfig, ShopifyStorefrontConfig};
use crate::shopify::stats::{PerformanceMonitor, PerformanceStats};
use crate::shopify::types::{
    Article, Blog, Cart, CartLineInput, CartLineUpdateInput, Collection, Product,
    ProductConnection,
};
use crate::shopify::{GraphQLError, RetryPolicy, ShopifyError};

pub use cache::ResponseCache;
use conversions::{convert_cart, flatten_articles, user_errors_to_error};
use queries::fragments::CartMutationPayload;
use queries::{
    AddToCart, CreateCart, GetBlogArticles, GetBlogs, GetCart, GetCollectionByHandle,
    GetCollectionHandles, GetCollections, GetProductByHandle, GetProductHandles,
    GetProductRecommendations, GetProducts, RemoveFromCart, UpdateCartLines, add_to_cart,
    create_cart, get_blog_articles, get_blogs, get_cart, get_collection_by_handle,
    get_collection_handles, get_collections, get_product_by_handle, get_product_handles,
    get_product_recommendations, get_products, remove_from_cart, update_cart_lines,
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";
/// Largest page the Storefront API serves.
const MAX_PAGE_SIZE: i64 = 250;
/// Stop paginating handles after this many pages.
const MAX_HANDLE_PAGES: usize = 40;
const ERROR_BODY_PREVIEW: usize = 200;
const BLOG_COUNT: i64 = 10;
const COLLECTION_PRODUCT_COUNT: i64 = 12;
/// Operations whose results list the catalog rather than one resource.
const LISTING_OPERATIONS: &[&str] = &[
    "GetProducts",
    "GetProductHandles",
    "GetCollections",
    "GetCollectionHandles",
    "GetBlogs",
    "GetBlogArticles",
];

/// Whether a call may be answered from or stored into the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caching {
    Cached,
    Bypass,
}

/// Body for passthrough queries that don't have a typed operation.
#[derive(Serialize)]
struct RawQueryBody<'a> {
    query: &'a str,
    variables: &'a serde_json::Value,
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share the HTTP client, the response cache and the
/// performance monitor.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
    retry: RetryPolicy,
    cache: ResponseCache,
    monitor: PerformanceMonitor,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig, retry: RetryPolicy, cache: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                access_token: config.storefront_token.clone(),
                retry,
                cache: ResponseCache::new(cache),
                monitor: PerformanceMonitor::new(),
            }),
        }
    }

    /// Whether an access token is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.inner.access_token.expose_secret().trim().is_empty()
    }

    /// Execute a typed GraphQL operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
        caching: Caching,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::Variables: Serialize + Sync,
    {
        let body = Q::build_query(variables);
        let cache_key = match caching {
            Caching::Cached => Some(ResponseCache::key(body.operation_name, &body.variables)?),
            Caching::Bypass => None,
        };

        let data = self.run(body.operation_name, &body, cache_key).await?;
        Ok(<Q::ResponseData as Deserialize>::deserialize(data.as_ref())?)
    }

    /// Cache lookup, retried network call, stale fallback.
    async fn run<B: Serialize + Sync>(
        &self,
        operation: &str,
        body: &B,
        cache_key: Option<String>,
    ) -> Result<Arc<serde_json::Value>, ShopifyError> {
        if !self.has_credentials() {
            return Err(ShopifyError::MissingCredentials);
        }

        let monitor = &self.inner.monitor;
        if let Some(key) = &cache_key {
            if let Some(data) = self.inner.cache.fresh(key).await {
                debug!(operation, "Cache hit");
                monitor.record_hit();
                return Ok(data);
            }
            monitor.record_miss();
        }

        let started = Instant::now();
        let result = self.send_with_retry(operation, body).await;
        monitor.record_call(started.elapsed());

        match result {
            Ok(data) => {
                let data = Arc::new(data);
                if let Some(key) = cache_key {
                    self.inner.cache.insert(key, Arc::clone(&data)).await;
                }
                Ok(data)
            }
            Err(err) => {
                monitor.record_failure();
                if err.is_retryable()
                    && let Some(key) = &cache_key
                    && let Some(stale) = self.inner.cache.stale(key).await
                {
                    warn!(operation, error = %err, "Shopify unavailable, serving stale response");
                    monitor.record_stale_fallback();
                    return Ok(stale);
                }
                Err(err)
            }
        }
    }

    async fn send_with_retry<B: Serialize + Sync>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<serde_json::Value, ShopifyError> {
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;
        let policy = self.inner.retry;

        (move || async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            self.send_once(body, policy.timeout_for_attempt(attempt)).await
        })
        .retry(policy.backoff())
        .when(ShopifyError::is_retryable)
        .notify(|err: &ShopifyError, delay: Duration| {
            warn!(operation, error = %err, retry_in = ?delay, "Retrying Storefront API call");
        })
        .await
    }

    /// One HTTP round trip; returns the GraphQL `data` payload.
    async fn send_once<B: Serialize + Sync>(
        &self,
        body: &B,
        timeout: Duration,
    ) -> Result<serde_json::Value, ShopifyError> {
        let timed_out = |e: reqwest::Error| {
            if e.is_timeout() {
                ShopifyError::Timeout(timeout)
            } else {
                ShopifyError::Http(e)
            }
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(timed_out)?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await.map_err(timed_out)?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(ERROR_BODY_PREVIEW).collect(),
            });
        }

        let response: Response<serde_json::Value> = serde_json::from_str(&response_text)
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
            })?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");

            // Shopify reports query cost throttling as a GraphQL error
            let throttled = errors.iter().any(|e| {
                e.extensions
                    .as_ref()
                    .and_then(|ext| ext.get("code"))
                    .and_then(serde_json::Value::as_str)
                    == Some("THROTTLED")
            });
            if throttled {
                return Err(ShopifyError::RateLimited(1));
            }

            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        response
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")]))
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails and no cached copy exists.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<ProductConnection, ShopifyError> {
        let variables = get_products::Variables {
            first: first.clamp(1, MAX_PAGE_SIZE),
            after,
            query: None,
        };
        let data = self
            .execute::<GetProducts>(variables, Caching::Cached)
            .await?;
        Ok(data.products.into())
    }

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };
        let data = self
            .execute::<GetProductByHandle>(variables, Caching::Cached)
            .await?;

        data.product
            .map(Into::into)
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))
    }

    /// Fetch several products concurrently, in the order of `handles`.
    ///
    /// Handles that don't resolve are skipped; a batch never fails as a whole.
    #[instrument(skip(self, handles), fields(count = handles.len()))]
    pub async fn get_products_by_handles(&self, handles: &[String]) -> Vec<Product> {
        let mut tasks = JoinSet::new();
        for (index, handle) in handles.iter().enumerate() {
            let client = self.clone();
            let handle = handle.clone();
            tasks.spawn(async move {
                let result = client.get_product_by_handle(&handle).await;
                (index, handle, result)
            });
        }

        let mut found = Vec::with_capacity(handles.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(product))) => found.push((index, product)),
                Ok((_, handle, Err(ShopifyError::NotFound(_)))) => {
                    debug!(handle = %handle, "Product in batch not found");
                }
                Ok((_, handle, Err(e))) => {
                    warn!(handle = %handle, error = %e, "Failed to fetch product in batch");
                }
                Err(e) => warn!(error = %e, "Product fetch task failed"),
            }
        }

        found.sort_by_key(|(index, _)| *index);
        found.into_iter().map(|(_, product)| product).collect()
    }

    /// Get product recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product_recommendations(
        &self,
        product_id: &str,
    ) -> Result<Vec<Product>, ShopifyError> {
        let variables = get_product_recommendations::Variables {
            product_id: product_id.to_string(),
        };
        let data = self
            .execute::<GetProductRecommendations>(variables, Caching::Cached)
            .await?;

        Ok(data
            .product_recommendations
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Every product handle in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails.
    #[instrument(skip(self))]
    pub async fn get_all_product_handles(&self) -> Result<Vec<String>, ShopifyError> {
        let mut handles = Vec::new();
        let mut after = None;
        for _ in 0..MAX_HANDLE_PAGES {
            let variables = get_product_handles::Variables {
                first: MAX_PAGE_SIZE,
                after: after.take(),
            };
            let data = self
                .execute::<GetProductHandles>(variables, Caching::Cached)
                .await?;
            let page_info = data.products.page_info.clone();
            handles.extend(data.products.into_nodes().map(|n| n.handle));

            match page_info {
                Some(info) if info.has_next_page && info.end_cursor.is_some() => {
                    after = info.end_cursor;
                }
                _ => break,
            }
        }
        Ok(handles)
    }

    // =========================================================================
    // Collection Methods
    // =========================================================================

    /// Get collections with their first products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails and no cached copy exists.
    #[instrument(skip(self))]
    pub async fn get_collections(&self, first: i64) -> Result<Vec<Collection>, ShopifyError> {
        let variables = get_collections::Variables {
            first: first.clamp(1, MAX_PAGE_SIZE),
            product_count: COLLECTION_PRODUCT_COUNT,
        };
        let data = self
            .execute::<GetCollections>(variables, Caching::Cached)
            .await?;
        Ok(data.collections.into_nodes().map(Into::into).collect())
    }

    /// Get a collection by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        product_count: i64,
        after: Option<String>,
    ) -> Result<Collection, ShopifyError> {
        let variables = get_collection_by_handle::Variables {
            handle: handle.to_string(),
            product_count: product_count.clamp(1, MAX_PAGE_SIZE),
            after,
        };
        let data = self
            .execute::<GetCollectionByHandle>(variables, Caching::Cached)
            .await?;

        data.collection
            .map(Into::into)
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))
    }

    /// Every collection handle in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails.
    #[instrument(skip(self))]
    pub async fn get_all_collection_handles(&self) -> Result<Vec<String>, ShopifyError> {
        let mut handles = Vec::new();
        let mut after = None;
        for _ in 0..MAX_HANDLE_PAGES {
            let variables = get_collection_handles::Variables {
                first: MAX_PAGE_SIZE,
                after: after.take(),
            };
            let data = self
                .execute::<GetCollectionHandles>(variables, Caching::Cached)
                .await?;
            let page_info = data.collections.page_info.clone();
            handles.extend(data.collections.into_nodes().map(|n| n.handle));

            match page_info {
                Some(info) if info.has_next_page && info.end_cursor.is_some() => {
                    after = info.end_cursor;
                }
                _ => break,
            }
        }
        Ok(handles)
    }

    // =========================================================================
    // Cart Methods (never cached - mutable state)
    // =========================================================================

    /// Create a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput { lines },
        };
        let data = self
            .execute::<CreateCart>(variables, Caching::Bypass)
            .await?;
        cart_from_payload(data.cart_create, "Failed to create cart")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is not found or the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };
        let data = self.execute::<GetCart>(variables, Caching::Bypass).await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_to_cart(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };
        let data = self
            .execute::<AddToCart>(variables, Caching::Bypass)
            .await?;
        cart_from_payload(data.cart_lines_add, "Failed to add to cart")
    }

    /// Update quantities of existing cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_cart_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };
        let data = self
            .execute::<UpdateCartLines>(variables, Caching::Bypass)
            .await?;
        cart_from_payload(data.cart_lines_update, "Failed to update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_from_cart(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let variables = remove_from_cart::Variables {
            cart_id: cart_id.to_string(),
            line_ids,
        };
        let data = self
            .execute::<RemoveFromCart>(variables, Caching::Bypass)
            .await?;
        cart_from_payload(data.cart_lines_remove, "Failed to remove from cart")
    }

    // =========================================================================
    // Blog Methods
    // =========================================================================

    /// List blogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails and no cached copy exists.
    #[instrument(skip(self))]
    pub async fn get_blogs(&self) -> Result<Vec<Blog>, ShopifyError> {
        let variables = get_blogs::Variables { first: BLOG_COUNT };
        let data = self.execute::<GetBlogs>(variables, Caching::Cached).await?;
        Ok(data.blogs.into_nodes().map(Into::into).collect())
    }

    /// Newest articles across all blogs.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails and no cached copy exists.
    #[instrument(skip(self))]
    pub async fn get_blog_posts(&self, first: i64) -> Result<Vec<Article>, ShopifyError> {
        let first = first.clamp(1, MAX_PAGE_SIZE);
        let variables = get_blog_articles::Variables {
            blog_count: BLOG_COUNT,
            article_count: first,
        };
        let data = self
            .execute::<GetBlogArticles>(variables, Caching::Cached)
            .await?;

        let mut articles = flatten_articles(data.blogs);
        articles.truncate(usize::try_from(first).unwrap_or(usize::MAX));
        Ok(articles)
    }

    /// Find an article by handle in any blog.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no blog has an article with this handle.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_blog_post_by_handle(&self, handle: &str) -> Result<Article, ShopifyError> {
        let variables = get_blog_articles::Variables {
            blog_count: BLOG_COUNT,
            article_count: MAX_PAGE_SIZE,
        };
        let data = self
            .execute::<GetBlogArticles>(variables, Caching::Cached)
            .await?;

        flatten_articles(data.blogs)
            .into_iter()
            .find(|a| a.handle == handle)
            .ok_or_else(|| ShopifyError::NotFound(format!("Article not found: {handle}")))
    }

    // =========================================================================
    // Passthrough
    // =========================================================================

    /// Forward an arbitrary query; never cached.
    ///
    /// # Errors
    ///
    /// Returns the same errors as typed operations, including GraphQL errors.
    #[instrument(skip(self, query, variables))]
    pub async fn raw_query(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<serde_json::Value, ShopifyError> {
        let body = RawQueryBody { query, variables };
        let data = self.run("RawQuery", &body, None).await?;
        Ok(Arc::unwrap_or_clone(data))
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop cached responses that mention `handle`.
    pub async fn invalidate_handle(&self, handle: &str) -> usize {
        let needle = format!(r#""handle":{}"#, serde_json::Value::String(handle.to_string()));
        self.inner
            .cache
            .invalidate_matching(|key| key.contains(&needle))
            .await
    }

    /// Drop cached listings (product pages, collection lists, blog lists).
    pub async fn invalidate_listings(&self) -> usize {
        self.inner
            .cache
            .invalidate_matching(|key| {
                key.split_once(':')
                    .is_some_and(|(operation, _)| LISTING_OPERATIONS.contains(&operation))
            })
            .await
    }

    /// Drop every cached response; returns how many were dropped.
    pub async fn invalidate_all(&self) -> usize {
        self.inner.cache.invalidate_all().await
    }

    /// Number of cached responses.
    #[must_use]
    pub fn cached_responses(&self) -> u64 {
        self.inner.cache.entry_count()
    }

    /// API timing and cache effectiveness.
    #[must_use]
    pub fn stats(&self) -> PerformanceStats {
        self.inner.monitor.snapshot()
    }
}

fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    failure: &str,
) -> Result<Cart, ShopifyError> {
    let Some(payload) = payload else {
        return Err(ShopifyError::GraphQL(vec![GraphQLError::message(failure)]));
    };

    if !payload.user_errors.is_empty() {
        return Err(user_errors_to_error(payload.user_errors));
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::GraphQL(vec![GraphQLError::message(failure)]))
}
