//! Bounded in-process cache of products keyed by handle.
//!
//! Sits in front of [`StorefrontClient`](crate::shopify::StorefrontClient) for
//! product detail lookups. Entries expire after a fixed TTL measured from
//! their last access; when full, an insert of a new handle evicts the entry
//! with the fewest accesses (oldest first on ties).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::CacheConfig;
use crate::shopify::Product;

#[derive(Debug)]
struct Entry {
    product: Arc<Product>,
    touched_at: Instant,
    access_count: u64,
}

/// Size and access figures for [`ProductCache`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ProductCacheStats {
    pub size: usize,
    pub capacity: usize,
    pub total_accesses: u64,
    /// `size / total_accesses`; 0 when nothing has been accessed.
    pub hit_rate: f64,
}

/// Product cache with access counting.
#[derive(Debug)]
pub struct ProductCache {
    entries: Mutex<HashMap<String, Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl ProductCache {
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.product_capacity, config.product_ttl)
    }

    pub fn get(&self, handle: &str) -> Option<Arc<Product>> {
        self.get_at(handle, Instant::now())
    }

    /// Look up `handle` as of `now`. Expired entries are removed.
    pub fn get_at(&self, handle: &str, now: Instant) -> Option<Arc<Product>> {
        let mut entries = self.lock();
        let entry = entries.get_mut(handle)?;

        if now.saturating_duration_since(entry.touched_at) > self.ttl {
            entries.remove(handle);
            return None;
        }

        entry.access_count += 1;
        entry.touched_at = now;
        Some(Arc::clone(&entry.product))
    }

    pub fn insert(&self, product: Product) -> Arc<Product> {
        self.insert_at(product, Instant::now())
    }

    /// Store `product` under its handle as of `now`.
    pub fn insert_at(&self, product: Product, now: Instant) -> Arc<Product> {
        let product = Arc::new(product);
        let mut entries = self.lock();

        if entries.len() >= self.capacity && !entries.contains_key(&product.handle) {
            let least_used = entries
                .iter()
                .min_by_key(|(_, e)| (e.access_count, e.touched_at))
                .map(|(handle, _)| handle.clone());
            if let Some(handle) = least_used {
                tracing::debug!(handle = %handle, "Evicting least used product");
                entries.remove(&handle);
            }
        }

        entries.insert(
            product.handle.clone(),
            Entry {
                product: Arc::clone(&product),
                touched_at: now,
                access_count: 1,
            },
        );
        product
    }

    /// Drop one handle; returns whether it was cached.
    pub fn remove(&self, handle: &str) -> bool {
        self.lock().remove(handle).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> ProductCacheStats {
        let entries = self.lock();
        let size = entries.len();
        let total_accesses: u64 = entries.values().map(|e| e.access_count).sum();
        drop(entries);

        #[allow(clippy::cast_precision_loss)] // bounded by capacity and access counts
        let hit_rate = if total_accesses == 0 {
            0.0
        } else {
            size as f64 / total_accesses as f64
        };

        ProductCacheStats {
            size,
            capacity: self.capacity,
            total_accesses,
            hit_rate,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
