//! Harmony colors derived from a primary color in HSV space.

use crate::types::{ColorPalette, ColorRgba};

use super::color::Hsv;

/// Number of gradient steps in a palette.
pub const GRADIENT_STEPS: usize = 10;

/// Build a full palette around `primary`.
pub fn build_palette(primary: ColorRgba) -> ColorPalette {
    let hsv = Hsv::from_rgba(primary);
    ColorPalette {
        primary,
        secondary: hsv.scale(0.8, 0.7).to_rgba(),
        accent: hsv.scale(1.2, 1.1).to_rgba(),
        complementary: hsv.rotate(180.0).to_rgba(),
        analogous: [hsv.rotate(30.0).to_rgba(), hsv.rotate(-30.0).to_rgba()],
        triadic: [hsv.rotate(120.0).to_rgba(), hsv.rotate(240.0).to_rgba()],
        gradient: gradient(hsv, GRADIENT_STEPS),
    }
}

/// `steps` shades from 30% to 100% of the source value, hue and
/// saturation held.
pub fn gradient(hsv: Hsv, steps: usize) -> Vec<ColorRgba> {
    (0..steps)
        .map(|i| {
            let factor = if steps > 1 {
                i as f64 / (steps - 1) as f64
            } else {
                1.0
            };
            Hsv {
                v: hsv.v * (0.3 + factor * 0.7),
                ..hsv
            }
            .to_rgba()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: ColorRgba, b: ColorRgba) {
        let eps = 1e-9;
        assert!(
            (a.r - b.r).abs() < eps
                && (a.g - b.g).abs() < eps
                && (a.b - b.b).abs() < eps
                && (a.a - b.a).abs() < eps,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_red_harmonies() {
        let palette = build_palette(ColorRgba::rgb(1.0, 0.0, 0.0));
        assert_close(palette.complementary, ColorRgba::rgb(0.0, 1.0, 1.0));
        assert_close(palette.analogous[0], ColorRgba::rgb(1.0, 0.5, 0.0));
        assert_close(palette.analogous[1], ColorRgba::rgb(1.0, 0.0, 0.5));
        assert_close(palette.triadic[0], ColorRgba::rgb(0.0, 1.0, 0.0));
        assert_close(palette.triadic[1], ColorRgba::rgb(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_secondary_is_darker() {
        let palette = build_palette(ColorRgba::rgb(1.0, 0.0, 0.0));
        let secondary = Hsv::from_rgba(palette.secondary);
        assert!((secondary.s - 0.8).abs() < 1e-9);
        assert!((secondary.v - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_accent_saturation_and_value_capped() {
        let palette = build_palette(ColorRgba::rgb(0.95, 0.1, 0.2));
        let accent = Hsv::from_rgba(palette.accent);
        assert!(accent.s <= 1.0);
        assert!(accent.v <= 1.0);
    }

    #[test]
    fn test_gradient_shape() {
        let palette = build_palette(ColorRgba::rgb(0.2, 0.4, 0.8));
        assert_eq!(palette.gradient.len(), GRADIENT_STEPS);

        let values: Vec<f64> = palette
            .gradient
            .iter()
            .map(|c| Hsv::from_rgba(*c).v)
            .collect();
        assert!((values[0] - 0.8 * 0.3).abs() < 1e-9);
        assert!((values[GRADIENT_STEPS - 1] - 0.8).abs() < 1e-9);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_step_gradient() {
        let shades = gradient(Hsv { h: 0.0, s: 1.0, v: 0.5 }, 1);
        assert_eq!(shades.len(), 1);
        assert_close(shades[0], ColorRgba::rgb(0.5, 0.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_every_derived_color_normalized(
            r in 0.0f64..=1.0,
            g in 0.0f64..=1.0,
            b in 0.0f64..=1.0,
        ) {
            let palette = build_palette(ColorRgba::rgb(r, g, b));
            for color in palette.colors() {
                prop_assert!(color.is_normalized(), "{:?}", color);
            }
            let accent = Hsv::from_rgba(palette.accent);
            prop_assert!(accent.s <= 1.0 && accent.v <= 1.0);

            let values: Vec<f64> = palette.gradient.iter().map(|c| Hsv::from_rgba(*c).v).collect();
            prop_assert!(values.windows(2).all(|w| w[0] <= w[1] + 1e-12));
        }
    }
}
