//! Error types for the Lumen transform and palette pipelines.
//!
//! Errors are organized by stage so a failed [`ProcessingResult`] can tell the
//! caller exactly which step went wrong. Every [`PipelineError`] maps onto a
//! serializable [`ErrorKind`] tag.
//!
//! [`ProcessingResult`]: crate::types::ProcessingResult

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for Lumen operations.
#[derive(Error, Debug)]
pub enum LumenError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source bytes could not be read or stat'ed
    #[error("IO error for {source_name}: {message}")]
    Io {
        source_name: String,
        message: String,
    },

    /// Neither the extension hint nor the byte signature is JPEG or PNG
    #[error("Unsupported format for {source_name}: {format}")]
    UnsupportedFormat { source_name: String, format: String },

    /// Bytes were recognized as a format but are malformed
    #[error("Decode error for {source_name}: {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// Output encoding failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Sampling produced no colors (zero-area image)
    #[error("No color could be extracted from a {width}x{height} image")]
    NoColorExtracted { width: u32, height: u32 },

    /// Source exceeds the configured byte limit
    #[error("File too large: {source_name} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        source_name: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed the configured limit
    #[error("Image too large: {source_name} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        source_name: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Processing options failed validation
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// No worker slot became free in time
    #[error("Timed out after {timeout_ms}ms waiting for a worker slot")]
    Timeout { timeout_ms: u64 },

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// The blocking task running the work panicked or was aborted
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}

/// Machine-readable category of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Io,
    UnsupportedFormat,
    Decode,
    Encode,
    NoColorExtracted,
    LimitExceeded,
    InvalidOptions,
    Timeout,
    Cancelled,
    Worker,
}

impl PipelineError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Encode(_) => ErrorKind::Encode,
            Self::NoColorExtracted { .. } => ErrorKind::NoColorExtracted,
            Self::FileTooLarge { .. } | Self::ImageTooLarge { .. } => ErrorKind::LimitExceeded,
            Self::InvalidOptions(_) => ErrorKind::InvalidOptions,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Worker(_) => ErrorKind::Worker,
        }
    }
}

/// Convenience type alias for Lumen results.
pub type Result<T> = std::result::Result<T, LumenError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
