//! JPEG encoding of transformed images.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

use crate::error::{PipelineError, PipelineResult};

/// Encode an image as JPEG at `quality` (1-100).
///
/// Grayscale images stay single-channel; everything else is flattened to
/// 8-bit RGB (alpha is dropped, JPEG has none).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> PipelineResult<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(PipelineError::Encode(format!(
            "JPEG quality must be between 1 and 100, got {}",
            quality
        )));
    }
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(PipelineError::Encode(format!(
            "Cannot encode a {}x{} image",
            width, height
        )));
    }

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    let result = match image {
        DynamicImage::ImageLuma8(gray) => {
            encoder.write_image(gray.as_raw(), width, height, ExtendedColorType::L8)
        }
        other => {
            let rgb = other.to_rgb8();
            encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|e| PipelineError::Encode(e.to_string()))?;
    Ok(buffer)
}
