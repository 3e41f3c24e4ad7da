//! Response cache for Storefront API calls.
//!
//! Entries are retained for the stale TTL but only count as fresh for the
//! (shorter) response TTL. Fresh entries short-circuit the network; stale
//! entries are only handed out when Shopify can't be reached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use serde::Serialize;

use crate::config::CacheConfig;

#[derive(Debug, Clone)]
struct CachedResponse {
    data: Arc<serde_json::Value>,
    stored_at: Instant,
}

/// `moka` cache of GraphQL `data` payloads keyed by operation + variables.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, CachedResponse>,
    fresh_ttl: Duration,
}

impl ResponseCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let retention = config.stale_ttl.max(config.response_ttl).max(Duration::from_millis(1));
        let entries = Cache::builder()
            .max_capacity(config.response_capacity)
            .time_to_live(retention)
            .build();

        Self {
            entries,
            fresh_ttl: config.response_ttl,
        }
    }

    /// Cache key for an operation: `"<operation>:<variables json>"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variables can't be serialized.
    pub fn key(operation: &str, variables: &impl Serialize) -> Result<String, serde_json::Error> {
        Ok(format!("{operation}:{}", serde_json::to_string(variables)?))
    }

    /// Entry younger than the response TTL.
    pub async fn fresh(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        self.entries
            .get(key)
            .await
            .filter(|entry| entry.stored_at.elapsed() < self.fresh_ttl)
            .map(|entry| entry.data)
    }

    /// Any retained entry, however old.
    pub async fn stale(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        self.entries.get(key).await.map(|entry| entry.data)
    }

    pub async fn insert(&self, key: String, data: Arc<serde_json::Value>) {
        self.entries
            .insert(
                key,
                CachedResponse {
                    data,
                    stored_at: Instant::now(),
                },
            )
            .await;
    }

    /// Drop every entry whose key matches; returns how many were dropped.
    pub async fn invalidate_matching(&self, matches: impl Fn(&str) -> bool) -> usize {
        let keys: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(key, _)| matches(key))
            .map(|(key, _)| key)
            .collect();
        for key in &keys {
            self.entries.invalidate(key.as_str()).await;
        }
        keys.len()
    }

    /// Drop every entry; returns how many were dropped.
    pub async fn invalidate_all(&self) -> usize {
        self.invalidate_matching(|_| true).await
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cache(response_ttl: Duration) -> ResponseCache {
        ResponseCache::new(&CacheConfig {
            response_ttl,
            ..CacheConfig::default()
        })
    }

    #[test]
    fn test_key_includes_operation_and_variables() {
        let key = ResponseCache::key("GetProductByHandle", &json!({ "handle": "tasse" })).unwrap();
        assert_eq!(key, r#"GetProductByHandle:{"handle":"tasse"}"#);
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served() {
        let cache = cache(Duration::from_secs(60));
        cache.insert("k".to_string(), Arc::new(json!({ "a": 1 }))).await;
        assert_eq!(*cache.fresh("k").await.unwrap(), json!({ "a": 1 }));
        assert!(cache.fresh("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_entry_goes_stale_after_ttl_but_is_retained() {
        let cache = cache(Duration::from_millis(20));
        cache.insert("k".to_string(), Arc::new(json!(1))).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(cache.fresh("k").await.is_none());
        assert_eq!(*cache.stale("k").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_invalidate_matching() {
        let cache = cache(Duration::from_secs(60));
        cache
            .insert(r#"GetProductByHandle:{"handle":"tasse"}"#.to_string(), Arc::new(json!(1)))
            .await;
        cache
            .insert(r#"GetProductByHandle:{"handle":"teller"}"#.to_string(), Arc::new(json!(2)))
            .await;

        let dropped = cache
            .invalidate_matching(|key| key.contains(r#""handle":"tasse""#))
            .await;
        assert_eq!(dropped, 1);
        assert!(cache.stale(r#"GetProductByHandle:{"handle":"tasse"}"#).await.is_none());
        assert!(cache.stale(r#"GetProductByHandle:{"handle":"teller"}"#).await.is_some());

        cache.invalidate_all().await;
        assert!(cache.stale(r#"GetProductByHandle:{"handle":"teller"}"#).await.is_none());
    }
}
