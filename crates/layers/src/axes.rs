//! Latitude/longitude axes kept in step with pan and zoom.
//!
//! Axis domains come from inverting the plot corners through the current
//! zoom transform and the projection; ticks are placed by projecting each
//! tick value forward again, so they line up with the map even though the
//! projection is not linear in latitude.

use foundation::math::{
    Projection, Vec2, ZoomTransform, canonical_f64, tick_precision, tick_step, ticks,
};
use foundation::{Aabb2, LonLat, wrap_lon_once};
use scene::{Element, GroupId, Shape, Style, TextAnchor, World};
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AxisKind {
    Latitude,
    Longitude,
}

/// `"{v}° N"` / `"{v}° E"` for `v >= 0`, `"{|v|}° S"` / `"{|v|}° W"` otherwise.
pub fn hemisphere_label(v: f64, precision: usize, kind: AxisKind) -> String {
    let v = canonical_f64(v);
    let (pos, neg) = match kind {
        AxisKind::Latitude => ('N', 'S'),
        AxisKind::Longitude => ('E', 'W'),
    };
    if v >= 0.0 {
        format!("{v:.precision$}° {pos}")
    } else {
        format!("{:.precision$}° {neg}", -v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub lat_ticks: usize,
    pub lon_ticks: usize,
    pub tick_size: f64,
    pub tick_font_size: f64,
    pub label_font_size: f64,
    pub background: String,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            lat_ticks: 6,
            lon_ticks: 10,
            tick_size: 6.0,
            tick_font_size: 10.0,
            label_font_size: 15.0,
            background: "white".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    pub value: f64,
    /// Screen pixel: y for latitude ticks, x for longitude ticks.
    pub position: f64,
    pub label: String,
}

#[derive(Debug)]
pub struct AxisSynchronizer {
    config: AxisConfig,
    plot: Aabb2,
    viewport: Aabb2,
    lat_group: GroupId,
    lon_group: GroupId,
    lat_domain: (f64, f64),
    lon_domain: (f64, f64),
    lat: Vec<AxisTick>,
    lon: Vec<AxisTick>,
}

impl AxisSynchronizer {
    pub fn new(world: &mut World, plot: Aabb2, viewport: Aabb2, config: AxisConfig) -> Self {
        Self {
            config,
            plot,
            viewport,
            lat_group: world.group("lat-axis"),
            lon_group: world.group("lon-axis"),
            lat_domain: (0.0, 0.0),
            lon_domain: (0.0, 0.0),
            lat: Vec::new(),
            lon: Vec::new(),
        }
    }

    /// `(bottom, top)` latitude of the visible plot.
    pub fn lat_domain(&self) -> (f64, f64) {
        self.lat_domain
    }

    /// `(left, right)` longitude along the bottom edge; `right` may exceed
    /// 180 when the view crosses the antimeridian.
    pub fn lon_domain(&self) -> (f64, f64) {
        self.lon_domain
    }

    pub fn lat_ticks(&self) -> &[AxisTick] {
        &self.lat
    }

    pub fn lon_ticks(&self) -> &[AxisTick] {
        &self.lon
    }

    /// Recomputes domains and ticks for the current view.
    pub fn sync(&mut self, projection: &Projection, transform: ZoomTransform) {
        let corner = |p: Vec2| projection.invert(transform.invert(p));
        let bl = corner(self.plot.bottom_left());
        let tl = corner(self.plot.top_left());
        let br = corner(self.plot.bottom_right());

        self.lat_domain = (bl.lat, tl.lat);
        let right = if br.lon < bl.lon { br.lon + 360.0 } else { br.lon };
        self.lon_domain = (bl.lon, right);

        // Latitude ticks along the central meridian, where y depends on
        // latitude only.
        let central = -projection.rotate_lon_deg;
        let (y0, y1) = (self.plot.min[1] - 0.5, self.plot.max[1] + 0.5);
        self.lat = axis_ticks(self.lat_domain, self.config.lat_ticks, AxisKind::Latitude, |v| {
            transform.apply_y(projection.project(LonLat::new(central, v)).y)
        })
        .into_iter()
        .filter(|t| t.position >= y0 && t.position <= y1)
        .collect();

        let (x0, x1) = (self.plot.min[0] - 0.5, self.plot.max[0] + 0.5);
        self.lon = axis_ticks(self.lon_domain, self.config.lon_ticks, AxisKind::Longitude, |v| {
            transform.apply_x(projection.project(LonLat::new(wrap_lon_once(v), bl.lat)).x)
        })
        .into_iter()
        .filter(|t| t.position >= x0 && t.position <= x1)
        .collect();

        trace!(
            lat = ?self.lat_domain,
            lon = ?self.lon_domain,
            lat_ticks = self.lat.len(),
            lon_ticks = self.lon.len(),
            "axes synced"
        );
    }

    /// Redraws both axes: background strips, titles, tick marks and labels.
    pub fn render(&self, world: &mut World) {
        let c = &self.config;
        world.clear_group(self.lat_group);
        world.clear_group(self.lon_group);

        let left = self.plot.min[0];
        let bottom = self.plot.max[1];
        let background = Style::filled(c.background.clone());
        let tick_style = Style::stroked("black", 1.0);
        let label_style = Style::filled("black").with_font_size(c.tick_font_size);
        let title_style = Style::filled("black").with_font_size(c.label_font_size);

        world.spawn(
            self.lat_group,
            Element::new(
                Shape::Rect {
                    origin: Vec2::new(self.viewport.min[0], self.viewport.min[1]),
                    width: left - self.viewport.min[0],
                    height: self.viewport.height(),
                },
                background.clone(),
            ),
        );
        world.spawn(
            self.lat_group,
            Element::new(
                Shape::text(
                    Vec2::new(c.label_font_size, (self.plot.min[1] + bottom) / 2.0),
                    "LATITUDE",
                    TextAnchor::Middle,
                ),
                title_style.clone(),
            ),
        );
        for t in &self.lat {
            world.spawn(
                self.lat_group,
                Element::new(
                    Shape::Line {
                        from: Vec2::new(left - c.tick_size, t.position),
                        to: Vec2::new(left, t.position),
                    },
                    tick_style.clone(),
                ),
            );
            world.spawn(
                self.lat_group,
                Element::new(
                    Shape::text(
                        Vec2::new(left - c.tick_size - 3.0, t.position + 3.0),
                        t.label.clone(),
                        TextAnchor::End,
                    ),
                    label_style.clone(),
                ),
            );
        }

        world.spawn(
            self.lon_group,
            Element::new(
                Shape::Rect {
                    origin: Vec2::new(self.viewport.min[0], bottom),
                    width: self.viewport.width(),
                    height: self.viewport.max[1] - bottom,
                },
                background,
            ),
        );
        world.spawn(
            self.lon_group,
            Element::new(
                Shape::text(
                    Vec2::new((left + self.plot.max[0]) / 2.0, self.viewport.max[1] - 5.0),
                    "LONGITUDE",
                    TextAnchor::Middle,
                ),
                title_style,
            ),
        );
        for t in &self.lon {
            world.spawn(
                self.lon_group,
                Element::new(
                    Shape::Line {
                        from: Vec2::new(t.position, bottom),
                        to: Vec2::new(t.position, bottom + c.tick_size),
                    },
                    tick_style.clone(),
                ),
            );
            world.spawn(
                self.lon_group,
                Element::new(
                    Shape::text(
                        Vec2::new(t.position, bottom + c.tick_size + c.tick_font_size + 2.0),
                        t.label.clone(),
                        TextAnchor::Middle,
                    ),
                    label_style.clone(),
                ),
            );
        }
    }
}

fn axis_ticks(
    domain: (f64, f64),
    count: usize,
    kind: AxisKind,
    position: impl Fn(f64) -> f64,
) -> Vec<AxisTick> {
    let (d0, d1) = domain;
    if !d0.is_finite() || !d1.is_finite() {
        return Vec::new();
    }
    let precision = tick_precision(tick_step(d0, d1, count));
    ticks(d0, d1, count)
        .into_iter()
        .map(|value| {
            let shown = match kind {
                AxisKind::Latitude => value,
                AxisKind::Longitude => wrap_lon_once(value),
            };
            AxisTick {
                value,
                position: position(value),
                label: hemisphere_label(shown, precision, kind),
            }
        })
        .collect()
}
