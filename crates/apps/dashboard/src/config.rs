use compute::DistributionConfig;
use layers::MapPlotConfig;
use layers::plots::{DistributionPlotConfig, HydrographPlotConfig};
use serde::{Deserialize, Serialize};
use streaming::ClientConfig;

/// Everything the dashboard needs, loadable from a partial JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub client: ClientConfig,
    pub map: MapPlotConfig,
    pub distribution: DistributionConfig,
    pub distribution_plot: DistributionPlotConfig,
    pub hydrograph_plot: HydrographPlotConfig,
    /// Zoom factor per wheel pixel: one wheel event scales by `2^(-dy * this)`.
    pub wheel_sensitivity: f64,
    /// Maximum pointer distance for hovering or clicking a link or gauge.
    pub pick_radius_px: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            map: MapPlotConfig::default(),
            distribution: DistributionConfig::default(),
            distribution_plot: DistributionPlotConfig::default(),
            hydrograph_plot: HydrographPlotConfig::default(),
            wheel_sensitivity: 0.002,
            pick_radius_px: 3.0,
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::DashboardConfig;

    #[test]
    fn nested_overrides_keep_other_defaults() {
        let c = DashboardConfig::from_json_str(
            r#"{
                "client": {"base_url": "http://dart:9000", "legacy_endpoints": true},
                "map": {"projection": {"padding_percent": 10}},
                "pick_radius_px": 5
            }"#,
        )
        .unwrap();
        assert_eq!(c.client.base_url, "http://dart:9000");
        assert!(c.client.legacy_endpoints);
        assert_eq!(c.map.projection.padding_percent, 10.0);
        assert_eq!(c.map.projection.edge_samples, 32);
        assert_eq!(c.map.max_zoom, 6.0);
        assert_eq!(c.pick_radius_px, 5.0);
        assert_eq!(c.wheel_sensitivity, 0.002);
        assert_eq!(c.distribution.bin_ticks, 50);
    }
}
