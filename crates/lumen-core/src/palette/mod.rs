//! Dominant-color extraction and harmony palettes.
//!
//! [`ColorAnalyzer`] samples a decoded image on a regular grid, clusters the
//! samples with k-means, ranks the centroids by a saturation/luminance
//! weight, and derives a [`ColorPalette`] from the winner. It holds no
//! shared state and can be cloned freely across threads.

pub mod color;
pub mod harmony;
pub mod kmeans;

use image::{DynamicImage, GenericImageView};

use crate::config::PaletteConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{ColorPalette, ColorRgba};

pub use color::Hsv;
pub use harmony::GRADIENT_STEPS;
pub use kmeans::{Clustering, KMeans};

/// Maximum number of dominant colors considered.
pub const MAX_CLUSTERS: usize = 5;

/// Fixed k-means iteration count.
pub const KMEANS_ITERATIONS: usize = 10;

/// Extracts dominant colors and builds palettes from decoded images.
#[derive(Debug, Clone)]
pub struct ColorAnalyzer {
    sample_count: usize,
}

impl Default for ColorAnalyzer {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

impl ColorAnalyzer {
    /// Create an analyzer targeting roughly `sample_count` samples per image.
    pub fn new(sample_count: usize) -> Self {
        Self {
            sample_count: sample_count.max(1),
        }
    }

    pub fn from_config(config: &PaletteConfig) -> Self {
        Self::new(config.sample_count)
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Build a harmony palette around the image's highest-weighted color.
    pub fn extract_palette(&self, image: &DynamicImage) -> PipelineResult<ColorPalette> {
        let dominant = self.dominant_colors(image);
        let primary = dominant
            .first()
            .copied()
            .ok_or(PipelineError::NoColorExtracted {
                width: image.width(),
                height: image.height(),
            })?;

        tracing::trace!(
            "Primary color ({:.3}, {:.3}, {:.3}) from {} candidates",
            primary.r,
            primary.g,
            primary.b,
            dominant.len()
        );
        Ok(harmony::build_palette(primary))
    }

    /// Cluster centroids sorted by descending weight. Empty for a
    /// zero-area image.
    pub fn dominant_colors(&self, image: &DynamicImage) -> Vec<ColorRgba> {
        let samples = self.sample_colors(image);
        let mut centroids = KMeans::new(MAX_CLUSTERS, KMEANS_ITERATIONS)
            .fit(&samples)
            .centroids;
        centroids.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        centroids
    }

    /// Grid step so that about `sample_count` pixels get visited.
    pub fn grid_step(&self, width: u32, height: u32) -> u32 {
        let area = width as f64 * height as f64;
        let step = (area / self.sample_count as f64).sqrt() as u32;
        step.max(1)
    }

    /// Sample every `grid_step`-th pixel in both axes, normalized from the
    /// image's native bit depth.
    pub fn sample_colors(&self, image: &DynamicImage) -> Vec<ColorRgba> {
        let (width, height) = image.dimensions();
        let step = self.grid_step(width, height);

        match image {
            DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_) => {
                let buf = image.to_rgba16();
                let scale = u16::MAX as f64;
                sample_grid(width, height, step, |x, y| {
                    let [r, g, b, a] = buf.get_pixel(x, y).0;
                    ColorRgba::new(
                        r as f64 / scale,
                        g as f64 / scale,
                        b as f64 / scale,
                        a as f64 / scale,
                    )
                })
            }
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                let buf = image.to_rgba32f();
                sample_grid(width, height, step, |x, y| {
                    let [r, g, b, a] = buf.get_pixel(x, y).0;
                    ColorRgba::new(r as f64, g as f64, b as f64, a as f64).clamped()
                })
            }
            _ => sample_grid(width, height, step, |x, y| {
                let [r, g, b, a] = image.get_pixel(x, y).0;
                ColorRgba::new(
                    r as f64 / 255.0,
                    g as f64 / 255.0,
                    b as f64 / 255.0,
                    a as f64 / 255.0,
                )
            }),
        }
    }
}

fn sample_grid<F>(width: u32, height: u32, step: u32, mut pixel: F) -> Vec<ColorRgba>
where
    F: FnMut(u32, u32) -> ColorRgba,
{
    let mut samples = Vec::new();
    for y in (0..height).step_by(step as usize) {
        for x in (0..width).step_by(step as usize) {
            samples.push(pixel(x, y));
        }
    }
    samples
}
