//! npm registry client: the production hydration strategy.
//!
//! Two lookups per package: metadata from the registry document and the
//! weekly download count from the downloads API. The whole fetch is bounded
//! by the configured timeout; a missing download count degrades to zero
//! rather than failing the hydration.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::debug;

use crate::application::hydration::{HydratedPackage, HydrationError, PackageHydrator};
use crate::config::RegistrySettings;
use crate::infra::error::InfraError;

pub struct NpmRegistry {
    client: reqwest::Client,
    metadata_base: String,
    downloads_base: String,
    timeout: std::time::Duration,
}

impl NpmRegistry {
    pub fn new(settings: &RegistrySettings) -> Result<Self, InfraError> {
        let client = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| {
                InfraError::configuration(format!("failed to build registry client: {err}"))
            })?;
        Ok(Self {
            client,
            metadata_base: settings.metadata_base_url.trim_end_matches('/').to_string(),
            downloads_base: settings.downloads_base_url.trim_end_matches('/').to_string(),
            timeout: settings.timeout(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("confronto/", env!("CARGO_PKG_VERSION"))
    }

    async fn metadata(&self, name: &str) -> Result<Option<MetadataDocument>, HydrationError> {
        let url = format!("{}/{name}", self.metadata_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| HydrationError::Request(err.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|err| HydrationError::Request(err.to_string()))?;
        let document = response
            .json::<MetadataDocument>()
            .await
            .map_err(|err| HydrationError::Decode(err.to_string()))?;
        Ok(Some(document))
    }

    async fn weekly_downloads(&self, name: &str) -> Result<i64, HydrationError> {
        let url = format!("{}/{name}", self.downloads_base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| HydrationError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| HydrationError::Request(err.to_string()))?;
        let point = response
            .json::<DownloadsPoint>()
            .await
            .map_err(|err| HydrationError::Decode(err.to_string()))?;
        Ok(point.downloads)
    }
}

#[async_trait]
impl PackageHydrator for NpmRegistry {
    async fn fetch(&self, name: &str) -> Result<Option<HydratedPackage>, HydrationError> {
        let document = match timeout(self.timeout, self.metadata(name)).await {
            Err(_) => return Err(HydrationError::Timeout(self.timeout)),
            Ok(Err(err)) => return Err(err),
            Ok(Ok(None)) => return Ok(None),
            Ok(Ok(Some(document))) => document,
        };

        let weekly_downloads = match timeout(self.timeout, self.weekly_downloads(name)).await {
            Ok(Ok(downloads)) => downloads,
            Ok(Err(err)) => {
                debug!(package = %name, error = %err, "weekly downloads unavailable");
                0
            }
            Err(_) => {
                debug!(package = %name, "weekly downloads lookup timed out");
                0
            }
        };

        Ok(Some(HydratedPackage {
            name: name.to_string(),
            description: document.description,
            repository: document.repository.map(RepositoryField::into_url),
            homepage: document.homepage,
            weekly_downloads,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct MetadataDocument {
    description: Option<String>,
    homepage: Option<String>,
    repository: Option<RepositoryField>,
}

/// The registry publishes `repository` either as a bare URL string or as an
/// object with a `url` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepositoryField {
    Detailed { url: String },
    Plain(String),
}

impl RepositoryField {
    fn into_url(self) -> String {
        match self {
            RepositoryField::Detailed { url } => url,
            RepositoryField::Plain(url) => url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadsPoint {
    #[serde(default)]
    downloads: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_field_accepts_both_shapes() {
        let detailed: RepositoryField =
            serde_json::from_str(r#"{"type":"git","url":"git+https://github.com/x/y.git"}"#)
                .expect("object shape");
        assert_eq!(detailed.into_url(), "git+https://github.com/x/y.git");

        let plain: RepositoryField =
            serde_json::from_str(r#""https://github.com/x/y""#).expect("string shape");
        assert_eq!(plain.into_url(), "https://github.com/x/y");
    }

    #[test]
    fn downloads_default_to_zero() {
        let point: DownloadsPoint = serde_json::from_str("{}").expect("empty document");
        assert_eq!(point.downloads, 0);
    }

    #[test]
    fn metadata_document_tolerates_missing_fields() {
        let document: MetadataDocument =
            serde_json::from_str(r#"{"description":"left pad"}"#).expect("partial document");
        assert_eq!(document.description.as_deref(), Some("left pad"));
        assert!(document.homepage.is_none());
        assert!(document.repository.is_none());
    }
}
