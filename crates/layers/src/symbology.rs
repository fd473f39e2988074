//! Color and size encodings for link values.

use foundation::math::LinearScale;
use serde::{Deserialize, Serialize};

/// 8-bit sRGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `rgb(r, g, b)`, the form written to `stroke`/`fill` attributes.
    pub fn css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.css())
    }
}

fn channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Cubehelix color (hue in degrees, saturation, lightness) to sRGB.
pub fn cubehelix(h: f64, s: f64, l: f64) -> Rgb {
    let h = (h + 120.0).to_radians();
    let a = s * l * (1.0 - l);
    let (sin_h, cos_h) = h.sin_cos();
    Rgb::new(
        channel(l + a * (-0.14861 * cos_h + 1.78277 * sin_h)),
        channel(l + a * (-0.29227 * cos_h - 0.90649 * sin_h)),
        channel(l + a * (1.97294 * cos_h)),
    )
}

/// The "warm" ramp: cubehelix from (-100°, 0.75, 0.35) to (80°, 1.5, 0.8),
/// interpolated the long way round in hue. `t` is clamped to `[0, 1]`.
pub fn warm(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    cubehelix(-100.0 + 180.0 * t, 0.75 + 0.75 * t, 0.35 + 0.45 * t)
}

/// Maps a value domain onto a color ramp.
#[derive(Debug, Copy, Clone)]
pub struct SequentialScale {
    pub domain: (f64, f64),
    ramp: fn(f64) -> Rgb,
}

impl SequentialScale {
    pub fn new(domain: (f64, f64), ramp: fn(f64) -> Rgb) -> Self {
        Self { domain, ramp }
    }

    pub fn warm(domain: (f64, f64)) -> Self {
        Self::new(domain, warm)
    }

    /// A collapsed domain maps everything to the middle of the ramp.
    pub fn apply(&self, v: f64) -> Rgb {
        let (d0, d1) = self.domain;
        let t = if d0 == d1 { 0.5 } else { (v - d0) / (d1 - d0) };
        (self.ramp)(t)
    }

    pub fn ramp(&self, t: f64) -> Rgb {
        (self.ramp)(t)
    }
}

/// Color and stroke width scales for one render, derived from the value extent.
#[derive(Debug, Copy, Clone)]
pub struct ValueEncodings {
    pub extent: (f64, f64),
    pub color: SequentialScale,
    pub size: LinearScale,
}

impl ValueEncodings {
    pub fn from_extent(extent: (f64, f64), size_range: [f64; 2]) -> Self {
        Self {
            extent,
            color: SequentialScale::warm(extent),
            size: LinearScale::new([extent.0, extent.1], size_range),
        }
    }

    pub fn color(&self, v: f64) -> String {
        self.color.apply(v).css()
    }

    pub fn width(&self, v: f64) -> f64 {
        self.size.apply(v)
    }
}

#[cfg(test)]
mod tests {
    use super::{Rgb, SequentialScale, ValueEncodings, warm};

    #[test]
    fn warm_ramp_endpoints() {
        assert_eq!(warm(0.0), Rgb::new(110, 64, 170));
        assert_eq!(warm(1.0), Rgb::new(175, 240, 91));
        assert_eq!(warm(-3.0), warm(0.0));
        assert_eq!(warm(0.0).css(), "rgb(110, 64, 170)");
    }

    #[test]
    fn sequential_scale_normalizes_domain() {
        let s = SequentialScale::warm((10.0, 20.0));
        assert_eq!(s.apply(10.0), warm(0.0));
        assert_eq!(s.apply(20.0), warm(1.0));
        assert_eq!(s.apply(15.0), warm(0.5));
        let flat = SequentialScale::warm((3.0, 3.0));
        assert_eq!(flat.apply(3.0), warm(0.5));
    }

    #[test]
    fn size_follows_configured_range() {
        let enc = ValueEncodings::from_extent((0.0, 100.0), [0.5, 10.0]);
        assert_eq!(enc.width(0.0), 0.5);
        assert_eq!(enc.width(100.0), 10.0);
        assert_eq!(enc.color(0.0), "rgb(110, 64, 170)");
    }
}
