//! Preset operations: creation, the toggle-like state machine, and cached
//! listings.
//!
//! `likes_count` is a projection of the Like rows and must equal their
//! cardinality after any completed toggle. The service keeps that invariant
//! by delegating every flip to a single atomic store operation, reading the
//! resulting pair back from the store (never computing it client-side), and
//! only then invalidating caches, so a cache miss after a write always
//! observes the post-write state.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::application::error::ServiceError;
use crate::application::identity::AuthContext;
use crate::application::pagination::PresetPage;
use crate::application::repos::{
    CreatePresetParams, LikeToggle, OwnerStats, PresetsRepo, PresetsWriteRepo, RepoError, UsersRepo,
};
use crate::cache::{CacheAside, CacheKey, WriteEvent, invalidation_keys};
use crate::domain::entities::PresetRecord;
use crate::domain::packages::PackageList;
use crate::domain::slug::preset_slug;
use crate::domain::types::PresetSort;

/// Maximum preset title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// A preset as submitted by a caller, before validation.
#[derive(Debug, Clone)]
pub struct NewPreset {
    pub title: String,
    pub packages: Vec<String>,
}

pub struct PresetService {
    users: Arc<dyn UsersRepo>,
    presets: Arc<dyn PresetsRepo>,
    writes: Arc<dyn PresetsWriteRepo>,
    cache: Arc<CacheAside>,
    page_size: u32,
}

impl PresetService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        presets: Arc<dyn PresetsRepo>,
        writes: Arc<dyn PresetsWriteRepo>,
        cache: Arc<CacheAside>,
        page_size: u32,
    ) -> Self {
        Self {
            users,
            presets,
            writes,
            cache,
            page_size: page_size.max(1),
        }
    }

    /// Validate and persist a new preset, then invalidate the bounded list
    /// prefix for both sort orders and the creator's personalized variants.
    pub async fn create_preset(
        &self,
        ctx: &AuthContext,
        input: NewPreset,
    ) -> Result<PresetRecord, ServiceError> {
        let caller = ctx.require_caller()?;

        let title = input.title.trim();
        if title.is_empty() {
            return Err(ServiceError::validation("a title is required"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ServiceError::validation(format!(
                "title may be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        let packages = PackageList::parse(&input.packages)?;

        self.users.ensure_user(caller).await?;

        let created_at = OffsetDateTime::now_utc();
        let params = CreatePresetParams {
            id: preset_slug(title, created_at),
            title: title.to_string(),
            trends_url: packages.trends_url(),
            packages,
            owner_id: caller.id.clone(),
        };
        let record = self.writes.create_preset(params).await?;

        self.cache
            .invalidate(&invalidation_keys(
                self.cache.config(),
                &WriteEvent::PresetCreated { actor: &caller.id },
            ))
            .await;

        info!(preset = %record.id, owner = %caller.id, "preset created");
        Ok(record)
    }

    /// Flip the caller's like on a preset and return the post-write state.
    ///
    /// Two concurrent toggles from the same user can both observe the
    /// not-liked state and race on the insert; the composite key rejects the
    /// loser, which is answered with the current state rather than an error,
    /// so retries are harmless.
    pub async fn toggle_like(
        &self,
        ctx: &AuthContext,
        slug: &str,
    ) -> Result<LikeToggle, ServiceError> {
        let caller = ctx.require_caller()?;
        self.users.ensure_user(caller).await?;

        let outcome = match self.writes.toggle_like(&caller.id, slug).await {
            Ok(outcome) => outcome,
            Err(RepoError::NotFound) => return Err(ServiceError::not_found("preset")),
            Err(RepoError::Duplicate { constraint }) => {
                debug!(
                    preset = %slug,
                    user = %caller.id,
                    %constraint,
                    "lost a same-user like race, answering with current state"
                );
                self.presets.like_state(&caller.id, slug).await?
            }
            Err(other) => return Err(other.into()),
        };

        self.cache
            .invalidate(&invalidation_keys(
                self.cache.config(),
                &WriteEvent::LikeToggled {
                    slug,
                    actor: &caller.id,
                },
            ))
            .await;

        debug!(
            preset = %slug,
            user = %caller.id,
            liked = outcome.liked,
            likes_count = outcome.likes_count,
            "like toggled"
        );
        Ok(outcome)
    }

    /// Aggregates over the caller's own presets, read straight from the
    /// store (never cached).
    pub async fn owner_stats(&self, ctx: &AuthContext) -> Result<OwnerStats, ServiceError> {
        let caller = ctx.require_caller()?;
        self.presets
            .owner_stats(&caller.id)
            .await
            .map_err(ServiceError::from)
    }

    /// A single preset by slug, cache-aside under its detail key. Absence is
    /// not cached, so a preset created moments later is visible immediately.
    pub async fn get_preset(&self, slug: &str) -> Result<PresetRecord, ServiceError> {
        let key = CacheKey::preset_detail(slug);
        if let Some(cached) = self.cache.get::<PresetRecord>(&key).await {
            return Ok(cached);
        }
        let record = self
            .presets
            .find_preset(slug)
            .await?
            .ok_or(ServiceError::not_found("preset"))?;
        self.cache
            .put(&key, &record, self.cache.config().entity_ttl())
            .await;
        Ok(record)
    }

    /// One page of presets, cache-aside. The viewer id joins the cache key
    /// only when present, because only then does the result depend on it.
    pub async fn list_presets(
        &self,
        ctx: &AuthContext,
        sort: PresetSort,
        page: u32,
    ) -> Result<PresetPage, ServiceError> {
        let page = page.max(1);
        let viewer = ctx.viewer_id();
        let key = CacheKey::preset_list(sort, page, viewer);
        let page_size = self.page_size;

        self.cache
            .read(&key, self.cache.config().list_ttl(), || async {
                let offset = (page - 1).saturating_mul(page_size);
                let items = self
                    .presets
                    .list_presets(sort, page_size, offset, viewer)
                    .await?;
                Ok::<_, RepoError>(PresetPage::from_items(items, page, page_size))
            })
            .await
            .map_err(ServiceError::from)
    }
}
