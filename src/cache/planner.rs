//! Invalidation planning for preset-affecting writes.
//!
//! List results are paginated and viewer-scoped, so a write cannot cheaply
//! enumerate every key its effect reaches. The policy is a bounded prefix:
//! the first `invalidation_page_bound` pages of both sort orders, their
//! variants personalized to the acting user, and the per-entity detail key
//! when one exists. Pages beyond the bound serve stale data until TTL expiry.

use crate::domain::types::PresetSort;

use super::config::CacheConfig;
use super::keys::CacheKey;

/// A store write that can change cached preset aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent<'a> {
    PresetCreated { actor: &'a str },
    LikeToggled { slug: &'a str, actor: &'a str },
}

/// Every cache key the event invalidates, within the configured bound.
pub fn invalidation_keys(config: &CacheConfig, event: &WriteEvent<'_>) -> Vec<CacheKey> {
    let (actor, detail) = match event {
        WriteEvent::PresetCreated { actor } => (*actor, None),
        WriteEvent::LikeToggled { slug, actor } => (*actor, Some(*slug)),
    };

    let bound = config.invalidation_page_bound;
    let mut keys = Vec::with_capacity((bound as usize) * PresetSort::ALL.len() * 2 + 1);
    for page in 1..=bound {
        for sort in PresetSort::ALL {
            keys.push(CacheKey::preset_list(sort, page, None));
            keys.push(CacheKey::preset_list(sort, page, Some(actor)));
        }
    }
    if let Some(slug) = detail {
        keys.push(CacheKey::preset_detail(slug));
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_created_covers_both_sorts_and_actor_variants() {
        let config = CacheConfig::default();
        let keys = invalidation_keys(&config, &WriteEvent::PresetCreated { actor: "u1" });
        let rendered: Vec<String> = keys.iter().map(CacheKey::render).collect();

        assert!(rendered.contains(&"presets:list:likes:1".to_string()));
        assert!(rendered.contains(&"presets:list:new:1".to_string()));
        assert!(rendered.contains(&"presets:list:likes:1:viewer:u1".to_string()));
        assert!(rendered.contains(&"presets:list:new:1:viewer:u1".to_string()));
        assert_eq!(rendered.len(), 4);
    }

    #[test]
    fn like_toggle_adds_the_detail_key() {
        let config = CacheConfig::default();
        let keys = invalidation_keys(
            &config,
            &WriteEvent::LikeToggled {
                slug: "a-vs-b-xyz",
                actor: "u2",
            },
        );
        let rendered: Vec<String> = keys.iter().map(CacheKey::render).collect();

        assert!(rendered.contains(&"preset:a-vs-b-xyz".to_string()));
    }

    #[test]
    fn page_bound_limits_the_prefix() {
        let config = CacheConfig {
            invalidation_page_bound: 3,
            ..Default::default()
        };
        let keys = invalidation_keys(&config, &WriteEvent::PresetCreated { actor: "u1" });
        let rendered: Vec<String> = keys.iter().map(CacheKey::render).collect();

        assert!(rendered.contains(&"presets:list:likes:3".to_string()));
        assert!(!rendered.contains(&"presets:list:likes:4".to_string()));
        // 3 pages x 2 sorts x (anonymous + actor)
        assert_eq!(rendered.len(), 12);
    }
}
