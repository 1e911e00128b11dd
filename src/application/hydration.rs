//! Hydrate-on-miss strategy for package metadata.
//!
//! The strategy object is injected into the package service so the external
//! registry can be swapped out (a no-op in tests, a different catalog in
//! another deployment) without touching the read path.

use async_trait::async_trait;
use thiserror::Error;

/// Package metadata as fetched from the external registry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HydratedPackage {
    pub name: String,
    pub description: Option<String>,
    pub repository: Option<String>,
    pub homepage: Option<String>,
    pub weekly_downloads: i64,
}

#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("registry request failed: {0}")]
    Request(String),
    #[error("registry response could not be decoded: {0}")]
    Decode(String),
    #[error("registry request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// External lookup for packages the store has never seen.
#[async_trait]
pub trait PackageHydrator: Send + Sync {
    /// `Ok(None)` means the registry does not know the package; errors are
    /// degraded by the caller, never propagated to the request.
    async fn fetch(&self, name: &str) -> Result<Option<HydratedPackage>, HydrationError>;
}

/// Hydrator that knows nothing; reads behave as if the registry were down.
pub struct NoopHydrator;

#[async_trait]
impl PackageHydrator for NoopHydrator {
    async fn fetch(&self, _name: &str) -> Result<Option<HydratedPackage>, HydrationError> {
        Ok(None)
    }
}
