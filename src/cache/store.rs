//! Cache storage.
//!
//! [`CacheStore`] is the seam to the key-value backend; [`MemoryStore`] is
//! the in-process implementation: an LRU map of TTL-stamped entries behind a
//! poison-recovering `RwLock`. Entries expire passively on read.

use std::sync::RwLock;

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use time::OffsetDateTime;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// The persisted entry shape: a serialized value plus its expiry instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: OffsetDateTime,
}

impl CacheEntry {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache entry could not be encoded: {0}")]
    Codec(String),
}

/// Key-value cache backend operations.
///
/// Implementations must be safe for concurrent use; last-writer-wins on a
/// key is acceptable since entries are disposable.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;
    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;
    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// In-memory store with LRU eviction and passive TTL expiry.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.entry_limit_non_zero())),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = OffsetDateTime::now_utc();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => return Ok(Some(entry.clone())),
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "put").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn entry_expiring_in(ttl: Duration) -> CacheEntry {
        CacheEntry {
            value: "\"cached\"".to_string(),
            expires_at: OffsetDateTime::now_utc() + ttl,
        }
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = MemoryStore::new(&CacheConfig::default());

        assert!(store.get("k").await.expect("get").is_none());
        store
            .put("k", entry_expiring_in(Duration::from_secs(60)))
            .await
            .expect("put");

        let cached = store.get("k").await.expect("get").expect("entry");
        assert_eq!(cached.value, "\"cached\"");
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = MemoryStore::new(&CacheConfig::default());

        let expired = CacheEntry {
            value: "\"stale\"".to_string(),
            expires_at: OffsetDateTime::now_utc() - Duration::from_secs(1),
        };
        store.put("k", expired).await.expect("put");

        assert!(store.get("k").await.expect("get").is_none());
        // the expired entry is also dropped from the map
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new(&CacheConfig::default());

        store.delete("missing").await.expect("delete absent key");
        store
            .put("k", entry_expiring_in(Duration::from_secs(60)))
            .await
            .expect("put");
        store.delete("k").await.expect("delete");
        store.delete("k").await.expect("delete again");

        assert!(store.get("k").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn lru_eviction_respects_entry_limit() {
        let config = CacheConfig {
            entry_limit: 2,
            ..Default::default()
        };
        let store = MemoryStore::new(&config);

        for key in ["a", "b", "c"] {
            store
                .put(key, entry_expiring_in(Duration::from_secs(60)))
                .await
                .expect("put");
        }

        assert!(store.get("a").await.expect("get").is_none()); // evicted
        assert!(store.get("b").await.expect("get").is_some());
        assert!(store.get("c").await.expect("get").is_some());
    }
}
