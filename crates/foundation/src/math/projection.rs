//! Natural Earth I map projection fitted to a padded lon/lat extent.
//!
//! The pipeline is:
//! 1. pad the dataset bounding box ([`padded_extent`]),
//! 2. turn it into a clockwise ring ([`clockwise_ring`]),
//! 3. fit a longitude-rotated projection to the plot rectangle
//!    ([`Projection::fit_extent`]).

use serde::{Deserialize, Serialize};

use crate::bounds::{Aabb2, LonLat, LonLatBox, wrap_lon_once};
use crate::math::Vec2;

use std::f64::consts::{PI, TAU};

/// Reference scale the fit starts from.
const BASE_SCALE: f64 = 150.0;
const INVERT_EPSILON: f64 = 1e-12;
const INVERT_MAX_ITERATIONS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionFitError {
    NonFinite,
    /// The (padded) lon/lat box has no area.
    EmptyBox { width: f64, height: f64 },
    /// The pixel rectangle has no area.
    EmptyViewport,
    /// Fewer than three distinct ring vertices.
    RingTooShort(usize),
    /// The reference ring winds counterclockwise; fitting it would select the
    /// complement of the region.
    CounterClockwiseRing,
    /// The projected reference ring collapsed to a line or a point.
    DegenerateProjection,
}

impl std::fmt::Display for ProjectionFitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionFitError::NonFinite => write!(f, "bounding box has non-finite coordinates"),
            ProjectionFitError::EmptyBox { width, height } => {
                write!(f, "bounding box has zero area ({width} x {height} degrees)")
            }
            ProjectionFitError::EmptyViewport => write!(f, "plot rectangle has zero area"),
            ProjectionFitError::RingTooShort(n) => {
                write!(f, "reference ring needs at least 3 vertices, got {n}")
            }
            ProjectionFitError::CounterClockwiseRing => {
                write!(f, "reference ring must wind clockwise")
            }
            ProjectionFitError::DegenerateProjection => {
                write!(f, "projected reference ring has zero area")
            }
        }
    }
}

impl std::error::Error for ProjectionFitError {}

/// Natural Earth I, raw form: radians in, unit plane out (y up).
pub fn natural_earth_raw(lambda: f64, phi: f64) -> (f64, f64) {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    let x = lambda
        * (0.8707 - 0.131979 * phi2
            + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4)));
    let y = phi
        * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)));
    (x, y)
}

/// Inverse of [`natural_earth_raw`]; latitude is solved by Newton iteration.
pub fn natural_earth_raw_invert(x: f64, y: f64) -> (f64, f64) {
    let mut phi = y;
    for _ in 0..INVERT_MAX_ITERATIONS {
        let phi2 = phi * phi;
        let phi4 = phi2 * phi2;
        let f = phi
            * (1.007226
                + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
            - y;
        let df = 1.007226
            + phi2
                * (0.015085 * 3.0
                    + phi4 * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2 - 0.005916 * 11.0 * phi4));
        let delta = f / df;
        phi -= delta;
        if delta.abs() <= INVERT_EPSILON {
            break;
        }
    }
    let phi2 = phi * phi;
    let lambda = x
        / (0.8707
            + phi2 * (-0.131979 + phi2 * (-0.013791 + phi2 * phi2 * phi2 * (0.003971 - 0.001529 * phi2))));
    (lambda, phi)
}

fn wrap_lambda(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - TAU
    } else if lambda < -PI {
        lambda + TAU
    } else {
        lambda
    }
}

/// Longitude-rotated Natural Earth projection with pixel scale and translation.
///
/// Pixel y grows downward.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// Degrees added to every longitude before projecting.
    pub rotate_lon_deg: f64,
    pub scale: f64,
    pub translate: Vec2,
}

impl Projection {
    pub fn new(rotate_lon_deg: f64) -> Self {
        Self {
            rotate_lon_deg,
            scale: BASE_SCALE,
            translate: Vec2::new(0.0, 0.0),
        }
    }

    fn rotated_lambda(&self, lon_deg: f64) -> f64 {
        wrap_lambda((lon_deg + self.rotate_lon_deg).to_radians())
    }

    pub fn project(&self, p: LonLat) -> Vec2 {
        let (x, y) = natural_earth_raw(self.rotated_lambda(p.lon), p.lat.to_radians());
        Vec2::new(
            self.translate.x + self.scale * x,
            self.translate.y - self.scale * y,
        )
    }

    pub fn invert(&self, p: Vec2) -> LonLat {
        let x = (p.x - self.translate.x) / self.scale;
        let y = (self.translate.y - p.y) / self.scale;
        let (lambda, phi) = natural_earth_raw_invert(x, y);
        let lon = wrap_lambda(lambda - self.rotate_lon_deg.to_radians());
        LonLat::new(lon.to_degrees(), phi.to_degrees())
    }

    /// Projects a polyline, splitting it where it crosses the rotated antimeridian.
    pub fn project_line(&self, points: &[LonLat]) -> Vec<Vec<Vec2>> {
        let mut parts: Vec<Vec<Vec2>> = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        let mut prev_lambda: Option<f64> = None;
        for p in points {
            let lambda = self.rotated_lambda(p.lon);
            if let Some(prev) = prev_lambda
                && (lambda - prev).abs() > PI
            {
                if current.len() > 1 {
                    parts.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            current.push(self.project(*p));
            prev_lambda = Some(lambda);
        }
        if current.len() > 1 {
            parts.push(current);
        }
        parts
    }

    /// Sets scale and translation so `ring` fills `extent`, centered.
    pub fn fit_extent(
        mut self,
        extent: Aabb2,
        ring: &[LonLat],
        edge_samples: usize,
    ) -> Result<Self, ProjectionFitError> {
        if extent.is_empty() || !extent.width().is_finite() || !extent.height().is_finite() {
            return Err(ProjectionFitError::EmptyViewport);
        }
        if ring.iter().any(|p| !p.lon.is_finite() || !p.lat.is_finite()) {
            return Err(ProjectionFitError::NonFinite);
        }
        if !ring_is_clockwise(ring)? {
            return Err(ProjectionFitError::CounterClockwiseRing);
        }

        self.scale = BASE_SCALE;
        self.translate = Vec2::new(0.0, 0.0);

        let mut b = Aabb2::empty();
        for p in densify_ring(ring, edge_samples) {
            b.expand(self.project(p));
        }
        let bw = b.width();
        let bh = b.height();
        if !(bw > 0.0 && bh > 0.0) || !bw.is_finite() || !bh.is_finite() {
            return Err(ProjectionFitError::DegenerateProjection);
        }

        let w = extent.width();
        let h = extent.height();
        let k = (w / bw).min(h / bh);
        self.scale = BASE_SCALE * k;
        self.translate = Vec2::new(
            extent.min[0] + (w - k * (b.max[0] + b.min[0])) / 2.0,
            extent.min[1] + (h - k * (b.max[1] + b.min[1])) / 2.0,
        );
        Ok(self)
    }
}

/// Expands `bbox` by `padding_percent` of its width/height (half on each side),
/// then folds each longitude edge back across ±180 at most once.
pub fn padded_extent(bbox: LonLatBox, padding_percent: f64) -> Result<LonLatBox, ProjectionFitError> {
    if !bbox.is_finite() || !padding_percent.is_finite() {
        return Err(ProjectionFitError::NonFinite);
    }
    let width = bbox.width();
    let height = bbox.height();
    if !(width > 0.0 && height > 0.0) {
        return Err(ProjectionFitError::EmptyBox { width, height });
    }

    let pad_w = width * padding_percent / 100.0 / 2.0;
    let pad_h = height * padding_percent / 100.0 / 2.0;

    let lon_min = bbox.lon_min - pad_w;
    let lon_max = bbox.lon_max + pad_w;
    Ok(LonLatBox {
        lon_min: if lon_min < -180.0 { lon_min + 360.0 } else { lon_min },
        lat_max: bbox.lat_max + pad_h,
        lon_max: if lon_max > 180.0 { lon_max - 360.0 } else { lon_max },
        lat_min: bbox.lat_min - pad_h,
    })
}

/// Closed clockwise ring over the box corners, starting at the north-west corner.
pub fn clockwise_ring(b: &LonLatBox) -> Vec<LonLat> {
    vec![
        LonLat::new(b.lon_min, b.lat_max),
        LonLat::new(b.lon_max, b.lat_max),
        LonLat::new(b.lon_max, b.lat_min),
        LonLat::new(b.lon_min, b.lat_min),
        LonLat::new(b.lon_min, b.lat_max),
    ]
}

/// Longitude step from `a` to `b`, taken the short way around.
fn lon_step(a: f64, b: f64) -> f64 {
    let d = b - a;
    if d > 180.0 {
        d - 360.0
    } else if d < -180.0 {
        d + 360.0
    } else {
        d
    }
}

/// Winding of a lon/lat ring (latitude up). Edges cross the antimeridian
/// the short way, so rings wider than 180° of longitude are read as their
/// narrower counterpart.
pub fn ring_is_clockwise(ring: &[LonLat]) -> Result<bool, ProjectionFitError> {
    let open = match ring.split_last() {
        Some((last, rest)) if !rest.is_empty() && *last == ring[0] => rest,
        _ => ring,
    };
    if open.len() < 3 {
        return Err(ProjectionFitError::RingTooShort(open.len()));
    }

    let mut x = open[0].lon;
    let mut unwrapped = Vec::with_capacity(open.len());
    unwrapped.push((x, open[0].lat));
    for w in open.windows(2) {
        x += lon_step(w[0].lon, w[1].lon);
        unwrapped.push((x, w[1].lat));
    }

    let mut area2 = 0.0;
    for i in 0..unwrapped.len() {
        let (x0, y0) = unwrapped[i];
        let (x1, y1) = unwrapped[(i + 1) % unwrapped.len()];
        area2 += x0 * y1 - x1 * y0;
    }
    if area2 == 0.0 {
        return Err(ProjectionFitError::DegenerateProjection);
    }
    Ok(area2 < 0.0)
}

/// Samples each ring edge along straight lon/lat lines (parallels and meridians
/// for a box), wrapping sampled longitudes back into `[-180, 180]`.
pub fn densify_ring(ring: &[LonLat], edge_samples: usize) -> Vec<LonLat> {
    let n = edge_samples.max(1);
    let mut out = Vec::with_capacity(ring.len() * n + 1);
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        let dlon = lon_step(a.lon, b.lon);
        let dlat = b.lat - a.lat;
        for i in 0..n {
            let t = i as f64 / n as f64;
            out.push(LonLat::new(wrap_lon_once(a.lon + dlon * t), a.lat + dlat * t));
        }
    }
    if let Some(last) = ring.last() {
        out.push(*last);
    }
    out
}

/// Knobs for [`build_projection`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Padding around the data box, as a percentage of its width/height.
    pub padding_percent: f64,
    /// Fixed longitude rotation; `None` centers on the dataset centroid.
    pub rotate_lon_deg: Option<f64>,
    /// Samples per ring edge when measuring the projected extent.
    pub edge_samples: usize,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            padding_percent: 20.0,
            rotate_lon_deg: None,
            edge_samples: 32,
        }
    }
}

/// A projection together with the geometry it was fitted to.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedProjection {
    pub projection: Projection,
    pub padded: LonLatBox,
    pub ring: Vec<LonLat>,
    pub extent: Aabb2,
}

/// Pads `bbox`, builds its clockwise ring and fits a rotated projection to `extent`.
///
/// The rotation is `config.rotate_lon_deg`, or the negated longitude of
/// `centroid` (falling back to the box center) so the data sits on the
/// central meridian.
pub fn build_projection(
    bbox: LonLatBox,
    centroid: Option<LonLat>,
    extent: Aabb2,
    config: &ProjectionConfig,
) -> Result<FittedProjection, ProjectionFitError> {
    let padded = padded_extent(bbox, config.padding_percent)?;
    let ring = clockwise_ring(&padded);
    let rotate = config
        .rotate_lon_deg
        .unwrap_or_else(|| -centroid.unwrap_or_else(|| bbox.center()).lon);
    if !rotate.is_finite() {
        return Err(ProjectionFitError::NonFinite);
    }
    let projection = Projection::new(rotate).fit_extent(extent, &ring, config.edge_samples)?;
    Ok(FittedProjection {
        projection,
        padded,
        ring,
        extent,
    })
}
