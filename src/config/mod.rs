//! Configuration layer: typed settings with layered precedence (file → env).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::warn;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "confronto";
const ENV_PREFIX: &str = "CONFRONTO";

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/confronto";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_LIST_PAGE_SIZE: u32 = 20;
const DEFAULT_REGISTRY_METADATA_BASE: &str = "https://registry.npmjs.com";
const DEFAULT_REGISTRY_DOWNLOADS_BASE: &str = "https://api.npmjs.org/downloads/point/last-week";
const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub registry: RegistrySettings,
    pub logging: LoggingSettings,
    pub presets: PresetSettings,
}

impl Settings {
    /// Load settings from the default file, an optional local override file,
    /// an optional explicit path, and `CONFRONTO_`-prefixed environment
    /// variables, in increasing precedence.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
            .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

/// Raw cache knobs; mirrored into `cache::CacheConfig` at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub list_ttl_secs: u64,
    pub entity_ttl_secs: u64,
    pub invalidation_page_bound: u32,
    pub entry_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = crate::cache::CacheConfig::default();
        Self {
            enabled: defaults.enabled,
            list_ttl_secs: defaults.list_ttl_secs,
            entity_ttl_secs: defaults.entity_ttl_secs,
            invalidation_page_bound: defaults.invalidation_page_bound,
            entry_limit: defaults.entry_limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub metadata_base_url: String,
    pub downloads_base_url: String,
    pub timeout_ms: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            metadata_base_url: DEFAULT_REGISTRY_METADATA_BASE.to_string(),
            downloads_base_url: DEFAULT_REGISTRY_DOWNLOADS_BASE.to_string(),
            timeout_ms: DEFAULT_REGISTRY_TIMEOUT_MS,
        }
    }
}

impl RegistrySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Base log level; one of trace|debug|info|warn|error|off.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or_else(|_| {
            warn!(level = %self.level, "unrecognized log level, falling back to info");
            LevelFilter::INFO
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresetSettings {
    /// Rows per listing page.
    pub page_size: u32,
}

impl Default for PresetSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}
