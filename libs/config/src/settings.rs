//! Producer settings
//!
//! Provides configuration loading for the feed producer from TOML files with
//! environment overrides. Loading and validation are separate steps so
//! command-line overrides can be applied in between.

use config_crate::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};

/// Complete producer configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProducerConfig {
    pub store: StoreSettings,
    pub refresh: RefreshSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

/// Document store connection
///
/// All three fields are mandatory; they default to empty so that a missing
/// value surfaces as [`ConfigError::MissingField`] rather than a serde error.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct StoreSettings {
    /// Store connection target, e.g. `file:///var/lib/vehicle-positions`
    pub uri: String,
    pub database: String,
    pub collection: String,
}

/// Refresh cadence and merge policy
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RefreshSettings {
    pub roster_interval_secs: u64,
    pub position_interval_secs: u64,
    /// Entries older than this are evicted after each position cycle; unset disables eviction
    pub stale_age_limit_ms: Option<u64>,
    pub initial_cursor_ms: u64,
}

/// Where the published feed goes
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ExportSettings {
    /// Feed file rewritten after every position cycle
    pub file_path: Option<PathBuf>,
    /// Address for the HTTP feed endpoint, e.g. `127.0.0.1:8080`
    pub http_bind: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            roster_interval_secs: defaults::ROSTER_INTERVAL_SECS,
            position_interval_secs: defaults::POSITION_INTERVAL_SECS,
            stale_age_limit_ms: None,
            initial_cursor_ms: defaults::INITIAL_CURSOR_MS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json: false,
        }
    }
}

impl RefreshSettings {
    pub fn roster_interval(&self) -> Duration {
        Duration::from_secs(self.roster_interval_secs)
    }

    pub fn position_interval(&self) -> Duration {
        Duration::from_secs(self.position_interval_secs)
    }
}

impl ExportSettings {
    /// Parsed HTTP bind address, if one is configured
    pub fn http_bind_addr(&self) -> ConfigResult<Option<SocketAddr>> {
        self.http_bind
            .as_deref()
            .map(|bind| {
                bind.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                    key: "export.http_bind",
                    reason: format!("{}: {}", bind, e),
                })
            })
            .transpose()
    }
}

impl ProducerConfig {
    /// Load configuration from a file with environment overrides
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// if present and otherwise skipped. The result is not yet validated.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(defaults::CONFIG_PATH), false),
        };

        if path.exists() {
            info!("Loading configuration from {:?}", path);
        } else {
            debug!("No configuration file at {:?}, using defaults and environment", path);
        }

        let config = Config::builder()
            .add_source(File::from(path.as_path()).required(required))
            .add_source(
                Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml_str(toml: &str) -> ConfigResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Check mandatory settings and value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.store.uri.trim().is_empty() {
            return Err(ConfigError::MissingField { key: "store.uri" });
        }
        if self.store.database.trim().is_empty() {
            return Err(ConfigError::MissingField { key: "store.database" });
        }
        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::MissingField { key: "store.collection" });
        }

        if self.refresh.roster_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "refresh.roster_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.refresh.position_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "refresh.position_interval_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.refresh.stale_age_limit_ms == Some(0) {
            return Err(ConfigError::Invalid {
                key: "refresh.stale_age_limit_ms",
                reason: "must be greater than zero; omit it to disable eviction".to_string(),
            });
        }

        self.export.http_bind_addr()?;
        Ok(())
    }

    /// Expand `$VAR` references in the store URI and export path
    fn expand_env_vars(&mut self) -> ConfigResult<()> {
        let uri = shellexpand::env(&self.store.uri).map_err(|e| ConfigError::Expansion {
            key: "store.uri",
            reason: e.to_string(),
        })?;
        self.store.uri = uri.to_string();

        if let Some(path) = &self.export.file_path {
            let raw = path.to_string_lossy();
            let expanded = shellexpand::env(&raw).map_err(|e| ConfigError::Expansion {
                key: "export.file_path",
                reason: e.to_string(),
            })?;
            self.export.file_path = Some(PathBuf::from(expanded.as_ref()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const FULL: &str = r#"
[store]
uri = "file:///var/lib/vehicle-positions"
database = "septa"
collection = "bus_locations"

[refresh]
roster_interval_secs = 600
position_interval_secs = 15
stale_age_limit_ms = 600000

[export]
file_path = "/srv/feeds/vehicle-positions.pb"
http_bind = "127.0.0.1:8080"

[logging]
level = "debug"
json = true
"#;

    #[test]
    fn test_load_full_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("feed_producer.toml");
        fs::write(&config_path, FULL).unwrap();

        let config = ProducerConfig::load(Some(&config_path)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.store.database, "septa");
        assert_eq!(config.store.collection, "bus_locations");
        assert_eq!(config.refresh.position_interval(), Duration::from_secs(15));
        assert_eq!(config.refresh.stale_age_limit_ms, Some(600_000));
        assert_eq!(
            config.export.http_bind_addr().unwrap(),
            Some("127.0.0.1:8080".parse().unwrap())
        );
        assert!(config.logging.json);
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = ProducerConfig::from_toml_str(
            r#"
[store]
uri = "memory:"
database = "transit"
collection = "locations"
"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.refresh.roster_interval_secs, defaults::ROSTER_INTERVAL_SECS);
        assert_eq!(config.refresh.position_interval_secs, defaults::POSITION_INTERVAL_SECS);
        assert_eq!(config.refresh.stale_age_limit_ms, None);
        assert_eq!(config.refresh.initial_cursor_ms, 0);
        assert!(config.export.file_path.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_store_settings_are_fatal() {
        let config = ProducerConfig::from_toml_str("").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { key: "store.uri" })
        ));

        let config = ProducerConfig::from_toml_str(
            r#"
[store]
uri = "memory:"
database = "transit"
collection = "  "
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { key: "store.collection" })
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ProducerConfig::from_toml_str(FULL).unwrap();
        config.refresh.position_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = ProducerConfig::from_toml_str(FULL).unwrap();
        config.refresh.stale_age_limit_ms = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = ProducerConfig::from_toml_str(FULL).unwrap();
        config.export.http_bind = Some("not-an-address".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "export.http_bind", .. })
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = ProducerConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
