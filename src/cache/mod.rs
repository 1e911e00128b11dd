//! Cache-aside layer.
//!
//! The cache is a read accelerator, never an authority: every entry is
//! disposable, carries a TTL, and is deleted (not updated) when a write could
//! have affected it. Writes go to the store first; invalidation follows.
//!
//! Configuration lives in [`CacheConfig`], passed in at construction:
//!
//! ```toml
//! [cache]
//! enabled = true
//! list_ttl_secs = 300
//! entity_ttl_secs = 300
//! invalidation_page_bound = 1
//! entry_limit = 1024
//! ```

mod config;
mod controller;
mod keys;
mod lock;
mod planner;
mod registry;
mod store;

pub use config::CacheConfig;
pub use controller::CacheAside;
pub use keys::CacheKey;
pub use planner::{WriteEvent, invalidation_keys};
pub use registry::DependencyRegistry;
pub use store::{CacheEntry, CacheError, CacheStore, MemoryStore};
