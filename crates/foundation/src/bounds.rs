use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Axis-aligned pixel rectangle. `min` is the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn is_empty(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.min[0], self.min[1])
    }

    pub fn bottom_left(&self) -> Vec2 {
        Vec2::new(self.min[0], self.max[1])
    }

    pub fn bottom_right(&self) -> Vec2 {
        Vec2::new(self.max[0], self.max[1])
    }

    /// Grows the box to include `p`.
    pub fn expand(&mut self, p: Vec2) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    /// An inverted box that any `expand` call will overwrite.
    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }
}

/// Space reserved around a plot area, in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Margins {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// The plot rectangle left inside a `width` x `height` viewport.
    pub fn plot_rect(&self, width: f64, height: f64) -> Aabb2 {
        Aabb2::new(
            [self.left, self.top],
            [width - self.right, height - self.bottom],
        )
    }
}

/// Longitude/latitude pair in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Lon/lat extent of a dataset, in the field order the backend sends it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LonLatBox {
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
    pub lat_min: f64,
}

impl LonLatBox {
    pub const fn new(lon_min: f64, lat_max: f64, lon_max: f64, lat_min: f64) -> Self {
        Self {
            lon_min,
            lat_max,
            lon_max,
            lat_min,
        }
    }

    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn is_finite(&self) -> bool {
        self.lon_min.is_finite()
            && self.lat_max.is_finite()
            && self.lon_max.is_finite()
            && self.lat_min.is_finite()
    }

    pub fn center(&self) -> LonLat {
        LonLat::new(
            (self.lon_min + self.lon_max) / 2.0,
            (self.lat_min + self.lat_max) / 2.0,
        )
    }
}

/// Folds a longitude back into `[-180, 180]` with a single 360° step.
///
/// Values more than one turn out of range stay out of range.
pub fn wrap_lon_once(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
