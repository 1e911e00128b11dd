//! Cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_LIST_TTL_SECS: u64 = 300;
const DEFAULT_ENTITY_TTL_SECS: u64 = 300;
const DEFAULT_INVALIDATION_PAGE_BOUND: u32 = 1;
const DEFAULT_ENTRY_LIMIT: usize = 1024;

/// Cache behavior knobs, passed into the controller at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disable to force every read down the compute path (always-miss).
    pub enabled: bool,
    /// TTL for cached list pages.
    pub list_ttl_secs: u64,
    /// TTL for cached single entities (preset detail, package).
    pub entity_ttl_secs: u64,
    /// How many leading pages of each list variant a write invalidates.
    ///
    /// Pages beyond the bound may serve stale data until their TTL expires;
    /// that staleness window is the accepted cost of not enumerating every
    /// page/viewer key combination.
    pub invalidation_page_bound: u32,
    /// Maximum entries held by the in-memory store.
    pub entry_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            list_ttl_secs: DEFAULT_LIST_TTL_SECS,
            entity_ttl_secs: DEFAULT_ENTITY_TTL_SECS,
            invalidation_page_bound: DEFAULT_INVALIDATION_PAGE_BOUND,
            entry_limit: DEFAULT_ENTRY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            list_ttl_secs: settings.list_ttl_secs,
            entity_ttl_secs: settings.entity_ttl_secs,
            invalidation_page_bound: settings.invalidation_page_bound,
            entry_limit: settings.entry_limit,
        }
    }
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    pub fn entity_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_ttl_secs)
    }

    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.list_ttl_secs, 300);
        assert_eq!(config.entity_ttl_secs, 300);
        assert_eq!(config.invalidation_page_bound, 1);
        assert_eq!(config.entry_limit, 1024);
    }

    #[test]
    fn entry_limit_clamps_to_min() {
        let config = CacheConfig {
            entry_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.entry_limit_non_zero().get(), 1);
    }

    #[test]
    fn ttls_convert_to_durations() {
        let config = CacheConfig {
            list_ttl_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.list_ttl(), Duration::from_secs(60));
    }
}
