//! Lumen Core - Embeddable image transform and palette library.
//!
//! Lumen takes raw JPEG or PNG bytes and produces size-constrained JPEG
//! output, memoized in a content-addressed cache. A separate analyzer turns
//! a decoded image into a harmony color palette.
//!
//! # Architecture
//!
//! ```text
//! bytes → hash → [cache] → decode → resize → encode JPEG → cache → result
//! decoded image → sample → k-means → rank → HSV harmonies → palette
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{Config, ImageInput, ImageProcessingEngine, ProcessingOptions};
//!
//! #[tokio::main]
//! async fn main() -> lumen_core::Result<()> {
//!     let config = Config::load()?;
//!     let engine = ImageProcessingEngine::new(&config);
//!
//!     let bytes = std::fs::read("./photo.png")?;
//!     let options = ProcessingOptions::default().with_max_width(1024);
//!     let result = engine.process(ImageInput::new(bytes), &options).await;
//!     println!("Saved {:.1}%", result.compression_rate);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod cache;
pub mod config;
pub mod error;
pub mod output;
pub mod palette;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use cache::SharedCache;
pub use config::Config;
pub use error::{ConfigError, ErrorKind, LumenError, PipelineError, PipelineResult, Result};
pub use output::{OutputFormat, OutputWriter};
pub use palette::ColorAnalyzer;
pub use pipeline::{FileDiscovery, ImageProcessingEngine};
pub use types::{
    ColorPalette, ColorRgba, EngineStats, ImageInput, ProcessingOptions, ProcessingResult,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
