//! The cache-aside controller.
//!
//! Reads check the cache and fall back to a compute closure whose result is
//! populated with a TTL; writes never touch cached values, they invalidate
//! them. Correctness lives in the store underneath: every cache failure on
//! this path is logged and absorbed, so a broken or disabled cache degrades
//! latency, never answers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::warn;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::store::{CacheEntry, CacheStore};

pub struct CacheAside {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
}

impl CacheAside {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get-or-compute. A hit returns the cached value verbatim; a miss runs
    /// `compute`, stores the result under `ttl`, and returns it. Compute
    /// failures propagate uncached.
    pub async fn read<T, E, F, Fut>(&self, key: &CacheKey, ttl: Duration, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }
        let value = compute().await?;
        self.put(key, &value, ttl).await;
        Ok(value)
    }

    /// Cache probe. Undecodable entries are dropped and treated as misses,
    /// as are backend failures.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        let rendered = key.render();
        match self.store.get(&rendered).await {
            Ok(Some(entry)) => match serde_json::from_str(&entry.value) {
                Ok(value) => {
                    counter!("confronto_cache_hit_total").increment(1);
                    Some(value)
                }
                Err(err) => {
                    warn!(key = %rendered, error = %err, "dropping undecodable cache entry");
                    if let Err(err) = self.store.delete(&rendered).await {
                        warn!(key = %rendered, error = %err, "cache delete failed");
                    }
                    counter!("confronto_cache_miss_total").increment(1);
                    None
                }
            },
            Ok(None) => {
                counter!("confronto_cache_miss_total").increment(1);
                None
            }
            Err(err) => {
                warn!(key = %rendered, error = %err, "cache read failed");
                counter!("confronto_cache_miss_total").increment(1);
                None
            }
        }
    }

    /// Populate a key. Failures are logged and swallowed: the caller already
    /// holds the computed value and the store write has already happened.
    pub async fn put<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        if !self.config.enabled {
            return;
        }
        let rendered = key.render();
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key = %rendered, error = %err, "cache value failed to encode");
                return;
            }
        };
        let entry = CacheEntry {
            value: encoded,
            expires_at: OffsetDateTime::now_utc() + ttl,
        };
        match self.store.put(&rendered, entry).await {
            Ok(()) => {
                counter!("confronto_cache_populate_total").increment(1);
            }
            Err(err) => {
                warn!(key = %rendered, error = %err, "cache populate failed");
            }
        }
    }

    /// Unconditionally delete the given keys. Absent keys are not an error.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            self.delete_rendered(&key.render()).await;
        }
    }

    /// Invalidate keys already rendered to their stored form (dependency
    /// registry output).
    pub async fn invalidate_rendered(&self, keys: &[String]) {
        for key in keys {
            self.delete_rendered(key).await;
        }
    }

    async fn delete_rendered(&self, rendered: &str) {
        if !self.config.enabled {
            return;
        }
        match self.store.delete(rendered).await {
            Ok(()) => {
                counter!("confronto_cache_invalidate_total").increment(1);
            }
            Err(err) => {
                warn!(key = %rendered, error = %err, "cache invalidation failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::super::store::{CacheError, MemoryStore};
    use super::*;

    fn controller() -> CacheAside {
        let config = CacheConfig::default();
        let store = Arc::new(MemoryStore::new(&config));
        CacheAside::new(config, store)
    }

    #[tokio::test]
    async fn miss_computes_and_populates() {
        let cache = controller();
        let key = CacheKey::package("react");

        let value: Result<String, CacheError> = cache
            .read(&key, Duration::from_secs(60), || async {
                Ok("computed".to_string())
            })
            .await;
        assert_eq!(value.expect("computed"), "computed");

        // second read is served from the cache, compute must not run
        let value: Result<String, CacheError> = cache
            .read(&key, Duration::from_secs(60), || async {
                panic!("compute ran on a hit")
            })
            .await;
        assert_eq!(value.expect("cached"), "computed");
    }

    #[tokio::test]
    async fn compute_errors_propagate_uncached() {
        let cache = controller();
        let key = CacheKey::package("vue");

        let result: Result<String, String> = cache
            .read(&key, Duration::from_secs(60), || async {
                Err("store down".to_string())
            })
            .await;
        assert_eq!(result.expect_err("propagated"), "store down");

        // the failure was not cached
        assert!(cache.get::<String>(&key).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_forces_recompute() {
        let cache = controller();
        let key = CacheKey::preset_detail("a-vs-b-1");

        cache.put(&key, &"v1".to_string(), Duration::from_secs(60)).await;
        cache.invalidate(std::slice::from_ref(&key)).await;

        assert!(cache.get::<String>(&key).await.is_none());
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::new(&config));
        let cache = CacheAside::new(config, store);
        let key = CacheKey::package("react");

        cache.put(&key, &"value".to_string(), Duration::from_secs(60)).await;
        assert!(cache.get::<String>(&key).await.is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Backend("unreachable".to_string()))
        }

        async fn put(&self, _key: &str, _entry: CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Backend("unreachable".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheError> {
            Err(CacheError::Backend("unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn broken_backend_never_fails_a_read() {
        let cache = CacheAside::new(CacheConfig::default(), Arc::new(BrokenStore));
        let key = CacheKey::package("left-pad");

        let value: Result<String, CacheError> = cache
            .read(&key, Duration::from_secs(60), || async {
                Ok("from the store of record".to_string())
            })
            .await;
        assert_eq!(value.expect("computed"), "from the store of record");

        // invalidation against a broken backend is absorbed too
        cache.invalidate(&[key]).await;
    }
}
