//! Base map: background, graticule and state borders under the data layers.

use formats::{MalformedTopologyError, MeshSelection, Point, Topology};
use foundation::math::{Projection, Vec2};
use foundation::{Aabb2, LonLat};
use scene::{Element, GroupId, Shape, Style, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::layer::Layer;

/// States and territories outside the contiguous United States.
pub const NON_CONUS_STATES: &[&str] = &[
    "Alaska",
    "Hawaii",
    "Puerto Rico",
    "American Samoa",
    "Guam",
    "Commonwealth of the Northern Mariana Islands",
    "United States Virgin Islands",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasemapConfig {
    pub background: String,
    /// Graticule spacing in degrees.
    pub graticule_step: f64,
    pub graticule_stroke_width: f64,
    pub border_color: String,
    pub border_stroke_width: f64,
    /// Topology object holding the state polygons.
    pub states_object: String,
    pub excluded_states: Vec<String>,
}

impl Default for BasemapConfig {
    fn default() -> Self {
        Self {
            background: "rgba(138, 210, 255, 0.4)".to_string(),
            graticule_step: 10.0,
            graticule_stroke_width: 0.1,
            border_color: "black".to_string(),
            border_stroke_width: 0.1,
            states_object: "states".to_string(),
            excluded_states: NON_CONUS_STATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const SAMPLE_DEG: f64 = 2.5;

fn sampled(from: f64, to: f64) -> Vec<f64> {
    let n = ((to - from) / SAMPLE_DEG).ceil().max(1.0) as usize;
    (0..=n)
        .map(|i| from + (to - from) * i as f64 / n as f64)
        .collect()
}

/// Meridians and parallels every `step` degrees.
///
/// Meridians run between ±80° latitude, except every 90th which reaches the
/// poles; parallels span ±80° and run all the way round.
pub fn graticule(step: f64) -> Vec<Vec<LonLat>> {
    if !(step > 0.0) {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut lon = -180.0;
    while lon < 180.0 {
        let reach = if lon % 90.0 == 0.0 { 90.0 } else { 80.0 };
        lines.push(
            sampled(-reach, reach)
                .into_iter()
                .map(|lat| LonLat::new(lon, lat))
                .collect(),
        );
        lon += step;
    }
    let mut lat = -80.0;
    while lat <= 80.0 {
        lines.push(
            sampled(-180.0, 180.0)
                .into_iter()
                .map(|lon| LonLat::new(lon, lat))
                .collect(),
        );
        lat += step;
    }
    lines
}

/// Drops the configured states from the topology's states object.
pub fn retain_configured_states(
    topology: &mut Topology,
    config: &BasemapConfig,
) -> Result<(), MalformedTopologyError> {
    topology.retain_geometries(&config.states_object, |g| {
        !g.name()
            .is_some_and(|n| config.excluded_states.iter().any(|s| s == n))
    })
}

fn project_lines<'a>(
    projection: &Projection,
    lines: impl IntoIterator<Item = &'a Vec<Point>>,
) -> Vec<Vec<Vec2>> {
    lines
        .into_iter()
        .flat_map(|line| {
            let points: Vec<LonLat> = line.iter().map(|p| LonLat::new(p[0], p[1])).collect();
            projection.project_line(&points)
        })
        .collect()
}

#[derive(Debug)]
pub struct Basemap {
    group: GroupId,
    config: BasemapConfig,
}

impl Basemap {
    pub fn new(world: &mut World, config: BasemapConfig, plot: Aabb2) -> Self {
        let group = world.group("basemap");
        if let Some(g) = world.group_info_mut(group) {
            g.clip = Some(plot);
        }
        Self { group, config }
    }

    pub fn config(&self) -> &BasemapConfig {
        &self.config
    }

    /// Redraws the base map. A malformed topology leaves the previous drawing.
    pub fn render(
        &self,
        world: &mut World,
        projection: &Projection,
        plot: Aabb2,
        topology: Option<&Topology>,
    ) -> Result<(), MalformedTopologyError> {
        let borders = match topology {
            Some(t) => {
                let exterior = t.mesh(&self.config.states_object, MeshSelection::Exterior)?;
                let interior = t.mesh(&self.config.states_object, MeshSelection::Interior)?;
                Some((
                    project_lines(projection, &exterior),
                    project_lines(projection, &interior),
                ))
            }
            None => None,
        };

        world.clear_group(self.group);
        world.spawn(
            self.group,
            Element::new(
                Shape::Rect {
                    origin: plot.top_left(),
                    width: plot.width(),
                    height: plot.height(),
                },
                Style::filled(self.config.background.clone()).with_class("background"),
            ),
        );

        let graticule: Vec<Vec<Vec2>> = graticule(self.config.graticule_step)
            .iter()
            .flat_map(|line| projection.project_line(line))
            .collect();
        world.spawn(
            self.group,
            Element::new(
                Shape::Path {
                    parts: graticule,
                    closed: false,
                },
                Style::stroked(
                    self.config.border_color.clone(),
                    self.config.graticule_stroke_width,
                )
                .with_class("graticule"),
            ),
        );

        if let Some((exterior, interior)) = borders {
            debug!(
                exterior = exterior.len(),
                interior = interior.len(),
                "state border meshes"
            );
            for (parts, class) in [(exterior, "border"), (interior, "states")] {
                world.spawn(
                    self.group,
                    Element::new(
                        Shape::Path {
                            parts,
                            closed: false,
                        },
                        Style::stroked(
                            self.config.border_color.clone(),
                            self.config.border_stroke_width,
                        )
                        .with_class(class),
                    ),
                );
            }
        }
        Ok(())
    }
}

impl Layer for Basemap {
    fn name(&self) -> &'static str {
        "basemap"
    }

    fn group(&self) -> GroupId {
        self.group
    }
}
