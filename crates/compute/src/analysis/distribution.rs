//! Ensemble distribution: shared-domain histograms of analysis and forecast
//! member values, plus an Epanechnikov density estimate.

use foundation::math::{nice, ticks};
use serde::{Deserialize, Serialize};

use crate::analysis::statistics::Statistics;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Requested tick count used as bin thresholds.
    pub bin_ticks: usize,
    /// Epanechnikov bandwidth, in value units.
    pub kde_bandwidth: f64,
    /// Requested number of density sample points.
    pub kde_samples: usize,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            bin_ticks: 50,
            kde_bandwidth: 7.0,
            kde_samples: 80,
        }
    }
}

/// Half-open `[x0, x1)`; the last bin of a histogram also holds `x1`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub x0: f64,
    pub x1: f64,
    pub count: usize,
}

/// Counts `values` into bins over `domain` split at `thresholds`.
///
/// Thresholds outside the open domain are ignored. Values outside the
/// domain and non-finite values are not counted.
pub fn histogram(values: &[f64], domain: (f64, f64), thresholds: &[f64]) -> Vec<Bin> {
    let (x0, x1) = domain;
    let cuts: Vec<f64> = thresholds
        .iter()
        .copied()
        .filter(|t| *t > x0 && *t < x1)
        .collect();

    let mut bins: Vec<Bin> = (0..=cuts.len())
        .map(|i| Bin {
            x0: if i == 0 { x0 } else { cuts[i - 1] },
            x1: if i == cuts.len() { x1 } else { cuts[i] },
            count: 0,
        })
        .collect();

    for &v in values {
        if !v.is_finite() || v < x0 || v > x1 {
            continue;
        }
        let i = cuts.partition_point(|t| *t <= v);
        bins[i].count += 1;
    }
    bins
}

/// `kernel(k)(v) = 0.75 * (1 - (v/k)^2) / k` for `|v/k| <= 1`, else 0.
pub fn epanechnikov(bandwidth: f64, v: f64) -> f64 {
    let u = v / bandwidth;
    if u.abs() <= 1.0 {
        0.75 * (1.0 - u * u) / bandwidth
    } else {
        0.0
    }
}

/// Mean kernel weight of `values` at each sample point, as `(x, density)`.
pub fn kernel_density(bandwidth: f64, xs: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
    xs.iter()
        .map(|&x| {
            let weights: Vec<f64> = values.iter().map(|v| epanechnikov(bandwidth, x - v)).collect();
            (x, Statistics::mean(&weights).unwrap_or(0.0))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionModel {
    /// Niced extent over both series.
    pub x_domain: (f64, f64),
    /// `[0, tallest bin]`, niced.
    pub y_domain: (f64, f64),
    pub analysis: Vec<Bin>,
    pub forecast: Vec<Bin>,
    /// Epanechnikov density of each series, as `(x, density)`.
    pub analysis_density: Vec<(f64, f64)>,
    pub forecast_density: Vec<(f64, f64)>,
    /// `[0, highest density]`, niced; drawn against its own axis.
    pub density_domain: (f64, f64),
}

impl DistributionModel {
    /// `None` when neither series has a finite value.
    pub fn build(analysis: &[f64], forecast: &[f64], config: &DistributionConfig) -> Option<Self> {
        let (lo, hi) = Statistics::extent(analysis.iter().chain(forecast.iter()).copied())?;
        let x_domain = nice(lo, hi, 10);
        let thresholds = ticks(x_domain.0, x_domain.1, config.bin_ticks);
        let analysis_bins = histogram(analysis, x_domain, &thresholds);
        let forecast_bins = histogram(forecast, x_domain, &thresholds);

        let tallest = analysis_bins
            .iter()
            .chain(forecast_bins.iter())
            .map(|b| b.count)
            .max()
            .unwrap_or(0);
        let y_domain = nice(0.0, tallest as f64, 10);

        let xs = ticks(x_domain.0, x_domain.1, config.kde_samples);
        let finite = |values: &[f64]| -> Vec<f64> {
            values.iter().copied().filter(|v| v.is_finite()).collect()
        };
        let analysis_density = kernel_density(config.kde_bandwidth, &xs, &finite(analysis));
        let forecast_density = kernel_density(config.kde_bandwidth, &xs, &finite(forecast));
        let peak = analysis_density
            .iter()
            .chain(forecast_density.iter())
            .map(|(_, d)| *d)
            .fold(0.0, f64::max);
        let density_domain = nice(0.0, peak, 10);

        Some(Self {
            x_domain,
            y_domain,
            analysis: analysis_bins,
            forecast: forecast_bins,
            analysis_density,
            forecast_density,
            density_domain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Bin, DistributionConfig, DistributionModel, epanechnikov, histogram, kernel_density};
    use pretty_assertions::assert_eq;

    #[test]
    fn bins_are_half_open_and_last_is_closed() {
        let bins = histogram(&[0.0, 1.0, 1.5, 2.0, 3.0, 3.5], (0.0, 3.0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(
            bins,
            vec![
                Bin { x0: 0.0, x1: 1.0, count: 1 },
                Bin { x0: 1.0, x1: 2.0, count: 2 },
                Bin { x0: 2.0, x1: 3.0, count: 2 },
            ]
        );
    }

    #[test]
    fn kernel_shape() {
        assert_eq!(epanechnikov(2.0, 0.0), 0.375);
        assert_eq!(epanechnikov(2.0, 2.0), 0.0);
        assert_eq!(epanechnikov(2.0, -2.5), 0.0);
        let d = kernel_density(2.0, &[0.0, 10.0], &[0.0, 0.0]);
        assert_eq!(d, vec![(0.0, 0.375), (10.0, 0.0)]);
    }

    #[test]
    fn model_shares_domain_across_series() {
        let analysis = [1.0, 2.0, 2.5, 9.9];
        let forecast = [3.0, 10.0];
        let model = DistributionModel::build(&analysis, &forecast, &DistributionConfig::default())
            .unwrap();
        assert_eq!(model.x_domain, (1.0, 10.0));
        assert_eq!(model.analysis.len(), model.forecast.len());
        assert_eq!(model.analysis.len(), 45);
        assert_eq!(model.analysis[0].x0, 1.0);
        assert_eq!(model.analysis[44].x1, 10.0);
        assert_eq!(model.analysis[0].count, 1);
        assert_eq!(model.analysis[5].x0, 2.0);
        assert_eq!(model.analysis[5].count, 1);
        assert_eq!(model.forecast[44].count, 1);
        assert_eq!(model.analysis.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(model.y_domain, (0.0, 1.0));
    }

    #[test]
    fn empty_input_has_no_model() {
        assert!(DistributionModel::build(&[], &[f64::NAN], &DistributionConfig::default()).is_none());
    }

    #[test]
    fn identical_values_share_one_bin() {
        let model =
            DistributionModel::build(&[4.0, 4.0], &[4.0], &DistributionConfig::default()).unwrap();
        assert_eq!(model.analysis, vec![Bin { x0: 4.0, x1: 4.0, count: 2 }]);
        assert_eq!(model.forecast[0].count, 1);
    }

    #[test]
    fn densities_cover_the_x_domain() {
        let config = DistributionConfig::default();
        let model = DistributionModel::build(&[10.0, 12.0, 15.0], &[20.0, f64::NAN], &config).unwrap();
        assert!(!model.analysis_density.is_empty());
        assert_eq!(model.analysis_density.len(), model.forecast_density.len());
        let (first, _) = model.analysis_density[0];
        let (last, _) = model.analysis_density[model.analysis_density.len() - 1];
        assert_eq!((first, last), model.x_domain);
        let peak = model
            .forecast_density
            .iter()
            .map(|(_, d)| *d)
            .fold(0.0, f64::max);
        // One finite forecast member: the kernel peak 0.75 / 7 at its value.
        assert!((peak - 0.75 / 7.0).abs() < 1e-12);
        assert_eq!(model.density_domain.0, 0.0);
        assert!(model.density_domain.1 >= peak);
    }
}
