//! Dependency registry for tag-scoped list keys.
//!
//! By-tag package listings are keyed by arbitrary tag subsets, so a tag
//! reassignment cannot enumerate the affected keys from its own inputs.
//! Instead, every populated by-tag key registers the tag ids it was computed
//! from; the reassignment drains the registered dependents of every touched
//! tag and invalidates exactly those.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

#[derive(Default)]
pub struct DependencyRegistry {
    dependents_by_tag: RwLock<HashMap<String, HashSet<String>>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` was computed from `tags`. Idempotent.
    pub fn register(&self, tags: &[String], key: &CacheKey) {
        let rendered = key.render();
        let mut dependents = rw_write(&self.dependents_by_tag, SOURCE, "register");
        for tag in tags {
            dependents
                .entry(tag.clone())
                .or_default()
                .insert(rendered.clone());
        }
    }

    /// Remove and return every key registered under any of `tags`. The keys
    /// re-register themselves the next time they are populated.
    pub fn take_dependents(&self, tags: &[String]) -> Vec<String> {
        let mut dependents = rw_write(&self.dependents_by_tag, SOURCE, "take_dependents");
        let mut keys = HashSet::new();
        for tag in tags {
            if let Some(registered) = dependents.remove(tag) {
                keys.extend(registered);
            }
        }
        keys.into_iter().collect()
    }

    pub fn tracked_tags(&self) -> usize {
        rw_read(&self.dependents_by_tag, SOURCE, "tracked_tags").len()
    }
}
