//! Image decoding with format detection and limit checks.
//!
//! Decoding is synchronous and CPU-bound; the engine runs it on the blocking
//! pool while holding a worker slot.

use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::ImageInput;

use super::validate::{SourceFormat, Validator};

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    validator: Validator,
}

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected source format
    pub format: SourceFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Encoded input size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self {
            validator: Validator::new(limits),
        }
    }

    /// Pick a decoder for the input.
    ///
    /// An extension hint that names anything other than JPEG or PNG is
    /// rejected outright. Otherwise the byte signature wins, falling back to
    /// the hinted format so a truncated file still reports a decode error.
    pub fn detect_format(input: &ImageInput) -> PipelineResult<SourceFormat> {
        let hinted = match input.extension() {
            Some(ext) => match SourceFormat::from_extension(&ext) {
                Some(format) => Some(format),
                None => {
                    return Err(PipelineError::UnsupportedFormat {
                        source_name: input.display_name().to_string(),
                        format: ext,
                    })
                }
            },
            None => None,
        };

        SourceFormat::from_signature(&input.bytes)
            .or(hinted)
            .ok_or_else(|| PipelineError::UnsupportedFormat {
                source_name: input.display_name().to_string(),
                format: "unknown".to_string(),
            })
    }

    /// Decode an input after checking its size, format and declared
    /// dimensions.
    pub fn decode(&self, input: &ImageInput) -> PipelineResult<DecodedImage> {
        let source_name = input.display_name();
        let file_size = input.bytes.len() as u64;
        self.validator.check_size(source_name, file_size)?;

        let format = Self::detect_format(input)?;
        let decode_err = |e: image::ImageError| PipelineError::Decode {
            source_name: source_name.to_string(),
            message: e.to_string(),
        };

        // Header-only read so oversized images are refused before allocating
        let (declared_w, declared_h) =
            image::ImageReader::with_format(Cursor::new(&input.bytes), format.image_format())
                .into_dimensions()
                .map_err(decode_err)?;
        self.validator
            .check_dimensions(source_name, declared_w, declared_h)?;

        let image = image::load_from_memory_with_format(&input.bytes, format.image_format())
            .map_err(decode_err)?;
        let (width, height) = image.dimensions();
        tracing::trace!(
            "Decoded {} as {} ({}x{})",
            source_name,
            format.as_str(),
            width,
            height
        );

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}
