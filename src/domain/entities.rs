//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::packages::PackageList;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: OffsetDateTime,
}

/// A stored preset. Immutable after creation except for `likes_count`, which
/// is a denormalized projection of the Like rows referencing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    /// Slug id, unique by construction (title + creation-timestamp suffix).
    pub id: String,
    pub title: String,
    pub packages: PackageList,
    pub trends_url: String,
    pub owner_id: String,
    pub likes_count: i64,
    pub created_at: OffsetDateTime,
}

/// A preset row as it appears in listings: owner profile joined in, and the
/// viewer's `liked` flag when the listing was requested with an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetListItem {
    pub id: String,
    pub title: String,
    pub packages: PackageList,
    pub trends_url: String,
    pub likes_count: i64,
    pub created_at: OffsetDateTime,
    pub owner_name: Option<String>,
    pub owner_avatar: Option<String>,
    /// `None` for anonymous listings; `Some` when a viewer id scoped the query.
    pub liked: Option<bool>,
}

/// A package from the catalog, keyed by its registry name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub description: Option<String>,
    pub weekly_downloads: i64,
    pub repository: Option<String>,
    pub homepage: Option<String>,
    pub last_refreshed_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: OffsetDateTime,
}
