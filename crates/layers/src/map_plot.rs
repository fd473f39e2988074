//! Map viewport configuration shared by every map layer.

use foundation::math::ProjectionConfig;
use foundation::{Aabb2, Margins};
use serde::{Deserialize, Serialize};

use crate::axes::AxisConfig;
use crate::basemap::BasemapConfig;
use crate::gauges::GaugeLayerConfig;
use crate::legend::LegendConfig;
use crate::links::LinkLayerConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapPlotConfig {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    /// Upper bound of the zoom scale extent; the lower bound is 1.
    pub max_zoom: f64,
    pub projection: ProjectionConfig,
    pub links: LinkLayerConfig,
    pub gauges: GaugeLayerConfig,
    pub axes: AxisConfig,
    pub legend: LegendConfig,
    pub basemap: BasemapConfig,
}

impl Default for MapPlotConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            margins: Margins::new(75.0, 10.0, 10.0, 50.0),
            max_zoom: 6.0,
            projection: ProjectionConfig::default(),
            links: LinkLayerConfig::default(),
            gauges: GaugeLayerConfig::default(),
            axes: AxisConfig::default(),
            legend: LegendConfig::default(),
            basemap: BasemapConfig::default(),
        }
    }
}

impl MapPlotConfig {
    pub fn viewport(&self) -> Aabb2 {
        Aabb2::new([0.0, 0.0], [self.width, self.height])
    }

    /// The area the map is fitted and zoomed in.
    pub fn plot_rect(&self) -> Aabb2 {
        self.margins.plot_rect(self.width, self.height)
    }
}
