//! Core data types exchanged with callers of the Lumen engines.
//!
//! Requests go in as [`ImageInput`] + [`ProcessingOptions`]; results come back
//! as [`ProcessingResult`] and [`ColorPalette`], both serializable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ErrorKind, PipelineError, PipelineResult};

/// JPEG quality used when a request leaves quality at 0.
pub const DEFAULT_QUALITY: u8 = 85;

/// Raw image bytes plus an optional filename used only to pick a decoder.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Undecoded file contents
    pub bytes: Vec<u8>,
    /// Filename or path hint, e.g. "beach.png"
    pub name: Option<String>,
}

impl ImageInput {
    /// Wrap raw bytes with no filename hint.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, name: None }
    }

    /// Attach a filename hint.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name used in logs and error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<memory>")
    }

    /// Lowercased extension of the filename hint, if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }
}

/// Per-request transform options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// JPEG quality 1-100; 0 selects the default (85)
    pub quality: u8,

    /// Upper bound on output width in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,

    /// Upper bound on output height in pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_height: Option<u32>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_width: None,
            max_height: None,
        }
    }
}

impl ProcessingOptions {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn with_max_height(mut self, max_height: u32) -> Self {
        self.max_height = Some(max_height);
        self
    }

    /// Quality actually handed to the encoder.
    pub fn effective_quality(&self) -> u8 {
        if self.quality == 0 {
            DEFAULT_QUALITY
        } else {
            self.quality
        }
    }

    /// Reject bounds that can never be satisfied.
    ///
    /// Quality is checked by the encoder so an out-of-range value surfaces as
    /// an encode failure.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_width == Some(0) {
            return Err(PipelineError::InvalidOptions(
                "max_width must be > 0".into(),
            ));
        }
        if self.max_height == Some(0) {
            return Err(PipelineError::InvalidOptions(
                "max_height must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a single transform request.
///
/// Built once per call and returned by value. Failures are data: `success`
/// is false and `error`/`error_kind` describe what went wrong.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Unique request identifier
    pub id: String,

    /// Whether an encoded output is available
    pub success: bool,

    /// Wall time spent in the request, in milliseconds
    pub processing_time_ms: f64,

    /// Input size in bytes
    pub input_size: u64,

    /// Encoded output size in bytes
    pub output_size: u64,

    /// Percentage saved relative to the input
    pub compression_rate: f64,

    /// Open-ended details: dimensions, content hash, cache_hit, ...
    pub metadata: BTreeMap<String, serde_json::Value>,

    /// Human-readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Failure category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Encoded JPEG bytes, kept in memory only
    #[serde(skip)]
    pub output: Option<Arc<[u8]>>,
}

impl ProcessingResult {
    /// An empty, not-yet-successful result.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            processing_time_ms: 0.0,
            input_size: 0,
            output_size: 0,
            compression_rate: 0.0,
            metadata: BTreeMap::new(),
            error: None,
            error_kind: None,
            output: None,
        }
    }

    /// Record a failure.
    pub fn fail(&mut self, err: &PipelineError) {
        self.success = false;
        self.error = Some(err.to_string());
        self.error_kind = Some(err.kind());
        self.output = None;
    }

    /// Record a successful encode of `input_size` bytes into `output`.
    pub fn succeed(&mut self, input_size: u64, output: Arc<[u8]>) {
        self.success = true;
        self.input_size = input_size;
        self.output_size = output.len() as u64;
        self.compression_rate = compression_rate(self.input_size, self.output_size);
        self.output = Some(output);
    }

    pub fn insert_metadata(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Whether the output came from the cache.
    pub fn cache_hit(&self) -> bool {
        self.metadata
            .get("cache_hit")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Look up a string metadata value.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// `(input - output) / input * 100`, or 0 for an empty input.
pub fn compression_rate(input_size: u64, output_size: u64) -> f64 {
    if input_size == 0 {
        return 0.0;
    }
    (input_size as f64 - output_size as f64) / input_size as f64 * 100.0
}

/// Format dimensions the way they appear in result metadata.
pub fn dimensions_label(width: u32, height: u32) -> String {
    format!("{}x{}", width, height)
}

/// An RGBA color with every channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorRgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ColorRgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Clamp every channel into [0, 1].
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
            a: self.a.clamp(0.0, 1.0),
        }
    }

    /// True when every channel lies in [0, 1].
    pub fn is_normalized(&self) -> bool {
        [self.r, self.g, self.b, self.a]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

/// A harmony palette derived from one primary color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: ColorRgba,
    pub secondary: ColorRgba,
    pub accent: ColorRgba,
    pub complementary: ColorRgba,
    /// Hue +30 then hue -30
    pub analogous: [ColorRgba; 2],
    /// Hue +120 then hue +240
    pub triadic: [ColorRgba; 2],
    /// Darkest to brightest
    pub gradient: Vec<ColorRgba>,
}

impl ColorPalette {
    /// Every color in the palette, primary first.
    pub fn colors(&self) -> impl Iterator<Item = &ColorRgba> {
        [
            &self.primary,
            &self.secondary,
            &self.accent,
            &self.complementary,
        ]
        .into_iter()
        .chain(self.analogous.iter())
        .chain(self.triadic.iter())
        .chain(self.gradient.iter())
    }
}

/// Counters and gauges describing an engine since construction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineStats {
    /// Requests received
    pub total_requests: u64,

    /// Requests that produced an output
    pub successful_ops: u64,

    /// Requests that failed
    pub failed_ops: u64,

    /// Requests answered from the cache
    pub cache_hits: u64,

    /// Cache hits as a percentage of requests
    pub cache_hit_rate: f64,

    /// Mean wall time per completed request, in milliseconds
    pub avg_processing_time_ms: f64,

    /// Seconds since the engine was built
    pub uptime_secs: f64,

    /// Entries currently cached
    pub cache_entries: usize,

    /// Bytes currently cached
    pub cache_bytes: usize,

    /// Worker pool capacity
    pub max_workers: usize,

    /// Requests inside decode/resize/encode right now
    pub active_workers: usize,

    /// Highest number of simultaneously active requests observed
    pub peak_active_workers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = ProcessingOptions::default();
        assert_eq!(options.quality, 85);
        assert!(options.max_width.is_none());
        assert!(options.max_height.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_zero_quality_uses_default() {
        let options = ProcessingOptions::default().with_quality(0);
        assert_eq!(options.effective_quality(), DEFAULT_QUALITY);
        let options = ProcessingOptions::default().with_quality(40);
        assert_eq!(options.effective_quality(), 40);
    }

    #[test]
    fn test_options_reject_zero_bounds() {
        let err = ProcessingOptions::default()
            .with_max_width(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOptions);
        assert!(ProcessingOptions::default()
            .with_max_height(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: ProcessingOptions = serde_json::from_str(r#"{"max_width": 640}"#).unwrap();
        assert_eq!(options.quality, 85);
        assert_eq!(options.max_width, Some(640));
        assert_eq!(options.max_height, None);
    }

    #[test]
    fn test_input_extension_hint() {
        let input = ImageInput::new(vec![]).with_name("Photos/Beach.JPG");
        assert_eq!(input.extension().as_deref(), Some("jpg"));
        assert_eq!(ImageInput::new(vec![]).extension(), None);
        assert_eq!(ImageInput::new(vec![]).display_name(), "<memory>");
    }

    #[test]
    fn test_compression_rate_formula() {
        assert_eq!(compression_rate(1000, 250), 75.0);
        assert_eq!(compression_rate(200, 300), -50.0);
        assert_eq!(compression_rate(0, 10), 0.0);
    }

    #[test]
    fn test_result_success_and_failure() {
        let mut result = ProcessingResult::new("req-1");
        result.succeed(400, Arc::from(vec![0u8; 100]));
        assert!(result.success);
        assert_eq!(result.output_size, 100);
        assert_eq!(result.compression_rate, 75.0);

        result.fail(&PipelineError::Encode("quality 0".into()));
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Encode));
        assert!(result.output.is_none());
    }

    #[test]
    fn test_result_serialization_skips_output_and_empty_error() {
        let mut result = ProcessingResult::new("req-2");
        result.succeed(10, Arc::from(vec![1u8; 4]));
        result.insert_metadata("cache_hit", true);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"cache_hit\":true"));
        assert!(!json.contains("\"error\""));
        assert!(!json.contains("\"output\""));

        let parsed: ProcessingResult = serde_json::from_str(&json).unwrap();
        assert!(parsed.cache_hit());
        assert!(parsed.output.is_none());
    }

    #[test]
    fn test_color_clamping() {
        let c = ColorRgba::new(1.2, -0.1, 0.5, 1.0).clamped();
        assert_eq!(c, ColorRgba::new(1.0, 0.0, 0.5, 1.0));
        assert!(c.is_normalized());
    }
}
