//! Repository traits describing persistence adapters.
//!
//! Everything above the store adapter talks through these traits; the
//! Postgres implementations live in `infra::db`, and tests substitute
//! in-memory ones.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::identity::CallerIdentity;
use crate::domain::entities::{PackageRecord, PresetListItem, PresetRecord};
use crate::domain::packages::PackageList;
use crate::domain::types::PresetSort;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePresetParams {
    pub id: String,
    pub title: String,
    pub packages: PackageList,
    pub trends_url: String,
    pub owner_id: String,
}

/// The post-write like state of a (user, preset) pair, read from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

/// Aggregates over a user's own presets, shown on their profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerStats {
    pub presets_count: i64,
    pub total_likes: i64,
}

#[derive(Debug, Clone)]
pub struct UpsertPackageParams {
    pub id: String,
    pub description: Option<String>,
    pub weekly_downloads: i64,
    pub repository: Option<String>,
    pub homepage: Option<String>,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Insert a minimal user row for the caller if absent; a row that
    /// already exists is left untouched.
    async fn ensure_user(&self, identity: &CallerIdentity) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PresetsRepo: Send + Sync {
    /// One page of presets with the owner profile joined in. When `viewer`
    /// is present each row carries that viewer's liked flag.
    async fn list_presets(
        &self,
        sort: PresetSort,
        limit: u32,
        offset: u32,
        viewer: Option<&str>,
    ) -> Result<Vec<PresetListItem>, RepoError>;

    async fn find_preset(&self, slug: &str) -> Result<Option<PresetRecord>, RepoError>;

    /// Current liked state and counter for a pair, outside any toggle.
    async fn like_state(&self, user_id: &str, preset_id: &str) -> Result<LikeToggle, RepoError>;

    /// Ground truth for the denormalized counter: the Like row count.
    async fn count_likes(&self, preset_id: &str) -> Result<i64, RepoError>;

    /// Preset count and accumulated likes across a user's presets.
    async fn owner_stats(&self, owner_id: &str) -> Result<OwnerStats, RepoError>;
}

#[async_trait]
pub trait PresetsWriteRepo: Send + Sync {
    async fn create_preset(&self, params: CreatePresetParams) -> Result<PresetRecord, RepoError>;

    /// Atomically flip the like state of (user, preset): row insert/delete
    /// and counter update commit or roll back together. A concurrent
    /// duplicate insert surfaces as [`RepoError::Duplicate`]; a missing
    /// preset as [`RepoError::NotFound`].
    async fn toggle_like(&self, user_id: &str, preset_id: &str) -> Result<LikeToggle, RepoError>;
}

#[async_trait]
pub trait PackagesRepo: Send + Sync {
    async fn find_package(&self, id: &str) -> Result<Option<PackageRecord>, RepoError>;

    /// Packages associated with any of `tag_ids`, most-downloaded first.
    async fn list_packages_by_tags(
        &self,
        tag_ids: &[String],
        exclude: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PackageRecord>, RepoError>;
}

#[async_trait]
pub trait PackagesWriteRepo: Send + Sync {
    /// Insert or refresh a package row by its natural key. Safe under
    /// concurrent duplicate hydration: the second writer wins, no error.
    async fn upsert_package(&self, params: UpsertPackageParams) -> Result<PackageRecord, RepoError>;

    /// Replace the package's tag set in one transaction (delete-then-insert)
    /// and return the previously assigned tag ids.
    async fn replace_package_tags(
        &self,
        package_id: &str,
        tag_ids: &[String],
    ) -> Result<Vec<String>, RepoError>;
}
