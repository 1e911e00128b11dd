//! Cache key definitions.
//!
//! Keys render deterministically to `<entity-or-list>:<discriminators joined
//! by ':'>`. Every parameter that affects a query's result participates in
//! its key; the viewer id participates only for the one query shape whose
//! result depends on it (preset listings with per-row liked flags).

use crate::domain::types::PresetSort;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One page of the preset listing, optionally personalized to a viewer.
    PresetList {
        sort: PresetSort,
        page: u32,
        viewer: Option<String>,
    },
    /// A single preset detail entry.
    PresetDetail { slug: String },
    /// A single package entry.
    Package { name: String },
    /// Packages related through a tag set. Tags are canonicalized (sorted,
    /// deduplicated) at construction so equal queries always share a key.
    PackagesByTags {
        tags: Vec<String>,
        exclude: Option<String>,
        limit: u32,
    },
}

impl CacheKey {
    pub fn preset_list(sort: PresetSort, page: u32, viewer: Option<&str>) -> Self {
        Self::PresetList {
            sort,
            page,
            viewer: viewer.map(str::to_string),
        }
    }

    pub fn preset_detail(slug: &str) -> Self {
        Self::PresetDetail {
            slug: slug.to_string(),
        }
    }

    pub fn package(name: &str) -> Self {
        Self::Package {
            name: name.to_string(),
        }
    }

    pub fn packages_by_tags(tags: &[String], exclude: Option<&str>, limit: u32) -> Self {
        let mut tags = tags.to_vec();
        tags.sort();
        tags.dedup();
        Self::PackagesByTags {
            tags,
            exclude: exclude.map(str::to_string),
            limit,
        }
    }

    /// The string stored against in the key-value cache.
    pub fn render(&self) -> String {
        match self {
            CacheKey::PresetList { sort, page, viewer } => match viewer {
                Some(viewer) => {
                    format!("presets:list:{}:{page}:viewer:{viewer}", sort.as_str())
                }
                None => format!("presets:list:{}:{page}", sort.as_str()),
            },
            CacheKey::PresetDetail { slug } => format!("preset:{slug}"),
            CacheKey::Package { name } => format!("package:{name}"),
            CacheKey::PackagesByTags {
                tags,
                exclude,
                limit,
            } => {
                let mut key = format!("packages:by-tags:{}", tags.join("+"));
                if let Some(exclude) = exclude {
                    key.push_str(":exclude:");
                    key.push_str(exclude);
                }
                key.push_str(":limit:");
                key.push_str(&limit.to_string());
                key
            }
        }
    }
}
