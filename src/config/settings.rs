//! Gateway settings
//!
//! Manages gateway settings stored in ~/.querygate/config.toml. The file is
//! read once at startup; the resulting [`GatewayConfig`] is immutable for
//! the lifetime of the process.

use crate::config::connections::{CatalogTarget, ConnectionConfig};
use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub engine: ConnectionConfig,

    /// Ordered catalog/schema targets; the first is the default
    #[serde(default)]
    pub targets: Vec<CatalogTarget>,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub pool: PoolSettings,

    #[serde(default)]
    pub query: QuerySettings,

    #[serde(default)]
    pub forecast: ForecastSettings,
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_entries")]
    pub max_entries: usize,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

/// Connection pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    #[serde(default = "default_pool_size")]
    pub max_connections: usize,
}

/// Engine call settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Rows per result page requested from the engine
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Forecast defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Horizon used when a forecast request does not name one
    #[serde(default = "default_horizon")]
    pub default_horizon: usize,
}

fn default_cache_entries() -> usize {
    100
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_pool_size() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> usize {
    1000
}

fn default_horizon() -> usize {
    7
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_cache_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: default_pool_size(),
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            default_horizon: default_horizon(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GatewayConfig {
    /// Configuration with default settings for the given engine and targets
    pub fn new(engine: ConnectionConfig, targets: Vec<CatalogTarget>) -> Self {
        Self {
            engine,
            targets,
            cache: CacheSettings::default(),
            pool: PoolSettings::default(),
            query: QuerySettings::default(),
            forecast: ForecastSettings::default(),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let mut config: GatewayConfig = toml::from_str(content)?;
        config.fill_default_target();
        config.validate()?;
        Ok(config)
    }

    /// Default target (first configured)
    pub fn default_target(&self) -> Option<&CatalogTarget> {
        self.targets.first()
    }

    /// Use the URL's database as the only target when none are configured.
    pub fn fill_default_target(&mut self) {
        if self.targets.is_empty() {
            if let Some(db) = &self.engine.default_database {
                self.targets.push(CatalogTarget::new(db.clone(), "public"));
            }
        }
    }

    /// Check invariants the gateway relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one catalog/schema target is required".into(),
            ));
        }
        if self.query.page_size == 0 {
            return Err(ConfigError::Invalid("query.page_size must be > 0".into()));
        }
        if self.query.timeout_secs == 0 {
            return Err(ConfigError::Invalid("query.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}

/// Load configuration from `path`, or from ~/.querygate/config.toml
pub fn load_config(path: Option<&Path>) -> ConfigResult<GatewayConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => ConnectionConfig::config_dir()?.join("config.toml"),
    };
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(&path)?;
    GatewayConfig::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = GatewayConfig::from_toml(
            r#"
            [engine]
            host = "engine.local"
            username = "reader"
            ssl_mode = "require"

            [[targets]]
            catalog = "sales"
            schema = "retail"

            [[targets]]
            catalog = "hr"

            [cache]
            max_entries = 5
            ttl_secs = 10

            [query]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.port, 5432);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[1].schema, "public");
        assert_eq!(config.default_target().unwrap().pool_key(), "sales.retail");
        assert_eq!(config.cache.max_entries, 5);
        assert_eq!(config.cache.ttl(), Duration::from_secs(10));
        assert_eq!(config.query.timeout(), Duration::from_secs(3));
        assert_eq!(config.query.page_size, 1000);
        assert_eq!(config.pool.max_connections, 10);
        assert_eq!(config.forecast.default_horizon, 7);
    }

    #[test]
    fn test_missing_targets_rejected() {
        let err = GatewayConfig::from_toml(
            r#"
            [engine]
            username = "reader"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_default_target_from_url_database() {
        let engine = ConnectionConfig::from_url("postgres://u:p@h/analytics").unwrap();
        let mut config = GatewayConfig::new(engine, Vec::new());
        config.fill_default_target();
        assert!(config.validate().is_ok());
        assert_eq!(config.targets[0], CatalogTarget::new("analytics", "public"));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("querygate-test-no-such-config.toml");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
