//! Configuration management for Lumen.
//!
//! Configuration is loaded from the platform config directory
//! (`<config_dir>/lumen/config.toml`) with sensible defaults. Every section
//! implements `Default`, so a partial file only overrides what it names.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Lumen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker pool and request handling
    pub engine: EngineConfig,

    /// Result cache bounds
    pub cache: CacheConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Processing defaults
    pub processing: ProcessingConfig,

    /// Palette extraction settings
    pub palette: PaletteConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/rs.lumen.lumen/config.toml
    /// - Linux: ~/.config/lumen/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\lumen\config\config.toml
    ///
    /// Falls back to ~/.lumen/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("rs", "lumen", "lumen")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".lumen").join("config.toml")
            })
    }

    /// Get the resolved output directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        let path_str = self.output.dir.to_string_lossy();
        let expanded = shellexpand::tilde(&path_str);
        PathBuf::from(expanded.into_owned())
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.engine.max_workers > 0);
        assert_eq!(config.engine.acquire_timeout_ms, 30_000);
        assert!(!config.engine.single_flight);
        assert_eq!(config.cache.max_bytes, 100 * 1024 * 1024);
        assert_eq!(config.processing.default_quality, 85);
        assert_eq!(config.palette.sample_count, 1000);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[engine]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[palette]"));
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [engine]
            max_workers = 3
            single_flight = true

            [cache]
            max_entries = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.max_workers, 3);
        assert!(config.engine.single_flight);
        assert_eq!(config.cache.max_entries, 64);
        assert_eq!(config.cache.shards, 16);
        assert_eq!(config.limits.max_file_size_mb, 32);
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        let err = Config::from_toml("[engine]\nmax_workers = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[palette]\nsample_count = 250\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.palette.sample_count, 250);
    }

    #[test]
    fn test_output_dir_expands_tilde() {
        let mut config = Config::default();
        config.output.dir = PathBuf::from("~/lumen-out");
        let resolved = config.output_dir();
        assert!(!resolved.to_string_lossy().starts_with('~'));
        assert!(resolved.ends_with("lumen-out"));
    }
}
