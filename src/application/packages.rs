//! Package operations: hydrate-on-miss lookups, tag-scoped related lists,
//! and the tag-assignment write path.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::application::error::ServiceError;
use crate::application::hydration::PackageHydrator;
use crate::application::repos::{
    PackagesRepo, PackagesWriteRepo, RepoError, UpsertPackageParams,
};
use crate::cache::{CacheAside, CacheKey, DependencyRegistry};
use crate::domain::entities::PackageRecord;

pub struct PackageService {
    packages: Arc<dyn PackagesRepo>,
    writes: Arc<dyn PackagesWriteRepo>,
    hydrator: Arc<dyn PackageHydrator>,
    cache: Arc<CacheAside>,
    registry: Arc<DependencyRegistry>,
}

impl PackageService {
    pub fn new(
        packages: Arc<dyn PackagesRepo>,
        writes: Arc<dyn PackagesWriteRepo>,
        hydrator: Arc<dyn PackageHydrator>,
        cache: Arc<CacheAside>,
        registry: Arc<DependencyRegistry>,
    ) -> Self {
        Self {
            packages,
            writes,
            hydrator,
            cache,
            registry,
        }
    }

    /// Look up a package, pulling it from the external registry the first
    /// time it is requested.
    ///
    /// This is a read path with a write side-effect: a store miss triggers a
    /// registry fetch and an upsert before the request is served. The upsert
    /// keys on the package name, so concurrent duplicate hydration attempts
    /// collapse into one row. Registry failure or timeout degrades the
    /// response to `None` and caches nothing, so the next request retries.
    pub async fn get_package(&self, name: &str) -> Result<Option<PackageRecord>, ServiceError> {
        let key = CacheKey::package(name);
        if let Some(cached) = self.cache.get::<PackageRecord>(&key).await {
            return Ok(Some(cached));
        }

        let entity_ttl = self.cache.config().entity_ttl();
        if let Some(record) = self.packages.find_package(name).await? {
            self.cache.put(&key, &record, entity_ttl).await;
            return Ok(Some(record));
        }

        match self.hydrator.fetch(name).await {
            Ok(Some(hydrated)) => {
                let record = self
                    .writes
                    .upsert_package(UpsertPackageParams {
                        id: name.to_string(),
                        description: hydrated.description,
                        weekly_downloads: hydrated.weekly_downloads,
                        repository: hydrated.repository,
                        homepage: hydrated.homepage,
                    })
                    .await?;
                self.cache.put(&key, &record, entity_ttl).await;
                counter!("confronto_hydration_total").increment(1);
                info!(package = %name, "package hydrated from registry");
                Ok(Some(record))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                counter!("confronto_hydration_failure_total").increment(1);
                warn!(
                    package = %name,
                    error = %err,
                    "package hydration failed, serving without metadata"
                );
                Ok(None)
            }
        }
    }

    /// Packages related through a tag set, cache-aside. Populated keys
    /// register their tag dependencies so reassignments can find them.
    pub async fn list_packages_by_tags(
        &self,
        tag_ids: &[String],
        exclude: Option<&str>,
        limit: u32,
    ) -> Result<Vec<PackageRecord>, ServiceError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::packages_by_tags(tag_ids, exclude, limit);
        let records = self
            .cache
            .read(&key, self.cache.config().list_ttl(), || async {
                self.packages
                    .list_packages_by_tags(tag_ids, exclude, limit)
                    .await
            })
            .await
            .map_err(ServiceError::from)?;

        self.registry.register(tag_ids, &key);
        Ok(records)
    }

    /// Replace a package's tag set, then invalidate every cached list that
    /// depended on an old or new tag, plus the package's own entry.
    pub async fn assign_package_tags(
        &self,
        package_id: &str,
        tag_ids: &[String],
    ) -> Result<(), ServiceError> {
        let previous = match self.writes.replace_package_tags(package_id, tag_ids).await {
            Ok(previous) => previous,
            Err(RepoError::NotFound) => return Err(ServiceError::not_found("package")),
            Err(other) => return Err(other.into()),
        };

        let mut affected = previous;
        affected.extend(tag_ids.iter().cloned());
        let dependents = self.registry.take_dependents(&affected);
        self.cache.invalidate_rendered(&dependents).await;
        self.cache
            .invalidate(&[CacheKey::package(package_id)])
            .await;

        info!(
            package = %package_id,
            tags = tag_ids.len(),
            invalidated_lists = dependents.len(),
            "package tags reassigned"
        );
        Ok(())
    }
}
