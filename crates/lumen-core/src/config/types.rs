//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Worker pool and request handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of requests inside decode/resize/encode at once
    pub max_workers: usize,

    /// How long a request may wait for a worker slot, in milliseconds
    pub acquire_timeout_ms: u64,

    /// Let concurrent misses for the same key wait for the first one
    /// instead of all recomputing
    pub single_flight: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        Self {
            max_workers: cpus * 2,
            acquire_timeout_ms: 30_000,
            single_flight: false,
        }
    }
}

/// Result cache bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Total encoded bytes kept across all shards
    pub max_bytes: usize,

    /// Total entries kept across all shards
    pub max_entries: usize,

    /// Number of independently locked shards
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024,
            max_entries: 1024,
            shards: 16,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum input size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height), checked from the header
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 32,
            max_image_dimension: 10000,
        }
    }
}

/// Processing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// JPEG quality the CLI requests when `--quality` is not given
    pub default_quality: u8,

    /// File extensions picked up when processing a directory
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            default_quality: 85,
            supported_formats: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

/// Palette extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Target number of pixels sampled per image
    pub sample_count: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self { sample_count: 1000 }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives re-encoded images
    pub dir: PathBuf,

    /// Output format: "json" or "jsonl"
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./optimized"),
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
