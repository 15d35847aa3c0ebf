//! Constrained resizing with nearest-neighbor resampling.
//!
//! The size plan clamps width first, then height. The order matters: a
//! width clamp shrinks the height as well, so the height bound is checked
//! against the already-shrunk value.

use image::{DynamicImage, ImageBuffer, Pixel};

/// Compute the output size for `width x height` under optional bounds.
///
/// Returns `None` when the image already fits (or no bound is given).
/// Scaled dimensions are truncated toward zero, then floored to 1.
pub fn plan_dimensions(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Option<(u32, u32)> {
    let mut new_width = width;
    let mut new_height = height;

    if let Some(max_w) = max_width {
        if new_width > max_w {
            let ratio = max_w as f64 / new_width as f64;
            new_width = max_w;
            new_height = (new_height as f64 * ratio) as u32;
        }
    }

    if let Some(max_h) = max_height {
        if new_height > max_h {
            let ratio = max_h as f64 / new_height as f64;
            new_height = max_h;
            new_width = (new_width as f64 * ratio) as u32;
        }
    }

    let new_width = new_width.max(1);
    let new_height = new_height.max(1);
    if (new_width, new_height) == (width, height) {
        None
    } else {
        Some((new_width, new_height))
    }
}

/// Source index sampled for destination index `dst`, or `None` when the
/// scaled coordinate falls outside the source.
pub fn source_index(dst: u32, src_size: u32, dst_size: u32) -> Option<u32> {
    if dst_size == 0 {
        return None;
    }
    let scale = src_size as f64 / dst_size as f64;
    let src = (dst as f64 * scale) as u64;
    if src < src_size as u64 {
        Some(src as u32)
    } else {
        None
    }
}

/// Nearest-neighbor resample of a single buffer.
///
/// Destination pixels whose source coordinate is out of range keep their
/// zero-initialized value.
pub fn sample_nearest<P>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>>
where
    P: Pixel,
{
    let mut dst = ImageBuffer::new(width, height);
    let (src_w, src_h) = src.dimensions();

    // Precompute the column lookup once; rows are resolved per line
    let columns: Vec<Option<u32>> = (0..width)
        .map(|x| source_index(x, src_w, width))
        .collect();

    for y in 0..height {
        let Some(src_y) = source_index(y, src_h, height) else {
            continue;
        };
        for (x, src_x) in columns.iter().enumerate() {
            if let Some(src_x) = src_x {
                dst.put_pixel(x as u32, y, *src.get_pixel(*src_x, src_y));
            }
        }
    }
    dst
}

/// Nearest-neighbor resize preserving the image's pixel layout where the
/// layout is one the encoder path understands.
pub fn resize_nearest(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(sample_nearest(buf, width, height)),
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(sample_nearest(buf, width, height))
        }
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(sample_nearest(buf, width, height)),
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(sample_nearest(buf, width, height))
        }
        DynamicImage::ImageLuma16(buf) => {
            DynamicImage::ImageLuma16(sample_nearest(buf, width, height))
        }
        DynamicImage::ImageRgb16(buf) => {
            DynamicImage::ImageRgb16(sample_nearest(buf, width, height))
        }
        DynamicImage::ImageRgba16(buf) => {
            DynamicImage::ImageRgba16(sample_nearest(buf, width, height))
        }
        other => DynamicImage::ImageRgba8(sample_nearest(&other.to_rgba8(), width, height)),
    }
}

/// Apply the size plan; returns the input unchanged when it already fits.
pub fn constrain(image: DynamicImage, max_width: Option<u32>, max_height: Option<u32>) -> DynamicImage {
    match plan_dimensions(image.width(), image.height(), max_width, max_height) {
        Some((w, h)) => {
            tracing::trace!("Resizing {}x{} -> {}x{}", image.width(), image.height(), w, h);
            resize_nearest(&image, w, h)
        }
        None => image,
    }
}
