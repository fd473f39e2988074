//! Pan/zoom transform and the constraints applied to it.

use serde::{Deserialize, Serialize};

use crate::bounds::Aabb2;
use crate::math::Vec2;

/// `screen = content * k + (x, y)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn new(k: f64, x: f64, y: f64) -> Self {
        Self { k, x, y }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x * self.k + self.x, p.y * self.k + self.y)
    }

    pub fn invert(&self, p: Vec2) -> Vec2 {
        Vec2::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
    }

    pub fn apply_x(&self, x: f64) -> f64 {
        x * self.k + self.x
    }

    pub fn apply_y(&self, y: f64) -> f64 {
        y * self.k + self.y
    }

    /// Translates by `(dx, dy)` in content units.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.k, self.x + self.k * dx, self.y + self.k * dy)
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!("translate({},{}) scale({})", self.x, self.y, self.k)
    }
}

/// Limits for interactive pan/zoom.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomBehavior {
    /// Viewport the gesture acts on.
    pub extent: Aabb2,
    pub scale_extent: [f64; 2],
    /// Content area that must stay covering the viewport.
    pub translate_extent: Aabb2,
}

impl ZoomBehavior {
    /// Zoom between 1x and `max_scale`, with the content pinned to `extent`.
    pub fn new(extent: Aabb2, max_scale: f64) -> Self {
        Self {
            extent,
            scale_extent: [1.0, max_scale],
            translate_extent: extent,
        }
    }

    /// Scales to `k` (clamped) keeping the content point under `anchor` fixed.
    pub fn scale_to(&self, t: ZoomTransform, k: f64, anchor: Vec2) -> ZoomTransform {
        let k = k.clamp(self.scale_extent[0], self.scale_extent[1]);
        let content = t.invert(anchor);
        let scaled = ZoomTransform::new(k, anchor.x - content.x * k, anchor.y - content.y * k);
        self.constrain(scaled)
    }

    pub fn scale_by(&self, t: ZoomTransform, factor: f64, anchor: Vec2) -> ZoomTransform {
        self.scale_to(t, t.k * factor, anchor)
    }

    /// Pans by a screen-space delta.
    pub fn pan_by(&self, t: ZoomTransform, delta: Vec2) -> ZoomTransform {
        self.constrain(ZoomTransform::new(t.k, t.x + delta.x, t.y + delta.y))
    }

    /// Shifts `t` so the translate extent keeps covering the viewport.
    pub fn constrain(&self, t: ZoomTransform) -> ZoomTransform {
        let e = &self.extent;
        let te = &self.translate_extent;
        let dx0 = (e.min[0] - t.x) / t.k - te.min[0];
        let dx1 = (e.max[0] - t.x) / t.k - te.max[0];
        let dy0 = (e.min[1] - t.y) / t.k - te.min[1];
        let dy1 = (e.max[1] - t.y) / t.k - te.max[1];
        let dx = if dx1 > dx0 {
            (dx0 + dx1) / 2.0
        } else {
            or_else_nonzero(dx0.min(0.0), dx1.max(0.0))
        };
        let dy = if dy1 > dy0 {
            (dy0 + dy1) / 2.0
        } else {
            or_else_nonzero(dy0.min(0.0), dy1.max(0.0))
        };
        t.translate(dx, dy)
    }
}

fn or_else_nonzero(a: f64, b: f64) -> f64 {
    if a != 0.0 { a } else { b }
}
