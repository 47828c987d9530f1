//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "attendance.db";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "ROLLCALL_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, sections separated
///    by `__`, e.g. `ROLLCALL_SEED__ON_STARTUP=false`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Demo data configuration.
    pub seed: SeedConfig,
    /// CSV export configuration.
    pub export: ExportConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/attendance.db`
    pub database_path: Option<PathBuf>,
}

/// Demo data configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Load the demo students and subjects into empty tables at startup.
    pub on_startup: bool,
}

/// CSV export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// strftime pattern for the `Time` column.
    pub time_format: String,
    /// Render times in the local time zone instead of UTC.
    pub local_time: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self { on_startup: true }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            time_format: "%-I:%M:%S %p".to_string(),
            local_time: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        crate::export::validate_time_format(&self.export.time_format)
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(config.seed.on_startup);
        assert_eq!(config.export.time_format, "%-I:%M:%S %p");
        assert!(config.export.local_time);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_time_format() {
        let mut config = Config::default();
        config.export.time_format = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("time_format"));
    }

    #[test]
    fn test_validate_malformed_time_format() {
        let mut config = Config::default();
        config.export.time_format = "%H:%".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("rollcall"));
        assert!(path.to_string_lossy().ends_with("attendance.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/register.db"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/register.db")
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("rollcall"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[storage]
database_path = "/tmp/register.db"

[seed]
on_startup = false

[export]
time_format = "%H:%M"
local_time = false
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/register.db"));
        assert!(!config.seed.on_startup);
        assert_eq!(config.export.time_format, "%H:%M");
        assert!(!config.export.local_time);
    }

    #[test]
    fn test_load_rejects_invalid_time_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[export]\ntime_format = \"\"\n").unwrap();

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("on_startup"));
        assert!(json.contains("time_format"));
    }

    #[test]
    fn test_export_config_deserialize_partial() {
        let export: ExportConfig = serde_json::from_str(r#"{"local_time": false}"#).unwrap();
        assert!(!export.local_time);
        assert_eq!(export.time_format, "%-I:%M:%S %p");
    }
}
