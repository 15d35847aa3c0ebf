//! HSV conversion and color weighting.
//!
//! Hue is in degrees [0, 360); saturation and value in [0, 1]. Every
//! conversion back to RGB clamps to [0, 1] and resets alpha to 1.

use crate::types::ColorRgba;

/// Hue/saturation/value representation of a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    /// Convert from RGB with the six-sector formula. Alpha is ignored.
    pub fn from_rgba(c: ColorRgba) -> Self {
        let max = c.r.max(c.g).max(c.b);
        let min = c.r.min(c.g).min(c.b);
        let delta = max - min;

        let s = if max == 0.0 { 0.0 } else { delta / max };
        let mut h = if delta == 0.0 {
            0.0
        } else if max == c.r {
            60.0 * (((c.g - c.b) / delta) % 6.0)
        } else if max == c.g {
            60.0 * ((c.b - c.r) / delta + 2.0)
        } else {
            60.0 * ((c.r - c.g) / delta + 4.0)
        };
        if h < 0.0 {
            h += 360.0;
        }

        Self { h, s, v: max }
    }

    /// Convert back to an opaque RGB color.
    pub fn to_rgba(self) -> ColorRgba {
        let h = self.h.rem_euclid(360.0);
        let c = self.v * self.s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = self.v - c;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            5 => (c, 0.0, x),
            _ => (0.0, 0.0, 0.0),
        };

        ColorRgba::rgb(r + m, g + m, b + m).clamped()
    }

    /// Same saturation and value, hue moved by `degrees` (wrapping).
    pub fn rotate(self, degrees: f64) -> Self {
        Self {
            h: (self.h + degrees).rem_euclid(360.0),
            ..self
        }
    }

    /// Same hue, saturation and value multiplied and capped at 1.
    pub fn scale(self, saturation: f64, value: f64) -> Self {
        Self {
            h: self.h,
            s: (self.s * saturation).min(1.0),
            v: (self.v * value).min(1.0),
        }
    }
}

impl ColorRgba {
    /// Rec. 601 luma.
    pub fn luminance(&self) -> f64 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    /// HSV saturation: `(max - min) / max`, or 0 for black.
    pub fn saturation(&self) -> f64 {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        if max == 0.0 {
            0.0
        } else {
            (max - min) / max
        }
    }

    /// Ranking weight favouring saturated mid-luminance colors.
    pub fn weight(&self) -> f64 {
        self.saturation() * (1.0 - (self.luminance() - 0.5).abs())
    }
}
