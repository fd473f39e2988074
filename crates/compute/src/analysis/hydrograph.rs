//! Hydrograph time series: forecast, analysis and (at gauges) observations
//! for one link over every model timestamp.

use foundation::Timestamp;
use foundation::math::nice;
use serde::{Deserialize, Serialize};

use crate::analysis::statistics::Statistics;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrographSample {
    pub timestamp: Timestamp,
    /// `None` where the backend had no value for this timestamp.
    pub forecast: Option<f64>,
    pub analysis: Option<f64>,
    pub observation: Option<f64>,
    /// Mean ± one standard deviation, when the backend sends it.
    pub forecast_band: Option<(f64, f64)>,
    pub analysis_band: Option<(f64, f64)>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Series {
    Forecast,
    Analysis,
    Observation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrographModel {
    /// Samples in timestamp order.
    pub samples: Vec<HydrographSample>,
    /// Hours since the Unix epoch.
    pub x_domain: (f64, f64),
    /// Niced extent over every present series.
    pub y_domain: (f64, f64),
    pub has_observations: bool,
}

impl HydrographModel {
    /// `None` when no sample carries a finite value.
    pub fn build(mut samples: Vec<HydrographSample>) -> Option<Self> {
        samples.sort_by_key(|s| s.timestamp);
        let has_observations = samples.iter().any(|s| s.observation.is_some());

        let values = samples.iter().flat_map(|s| {
            [s.forecast, s.analysis, s.observation]
                .into_iter()
                .flatten()
        });
        let (lo, hi) = Statistics::extent(values)?;
        let y_domain = nice(lo, hi, 10);

        let first = samples.first()?.timestamp.hours_since_epoch() as f64;
        let last = samples.last()?.timestamp.hours_since_epoch() as f64;

        Some(Self {
            samples,
            x_domain: (first, last),
            y_domain,
            has_observations,
        })
    }

    fn point(sample: &HydrographSample, series: Series) -> Option<(f64, f64)> {
        let v = match series {
            Series::Forecast => sample.forecast,
            Series::Analysis => sample.analysis,
            Series::Observation => sample.observation,
        }?;
        v.is_finite()
            .then(|| (sample.timestamp.hours_since_epoch() as f64, v))
    }

    /// `(hours, value)` points of one series; missing values are skipped.
    pub fn series(&self, series: Series) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| Self::point(s, series))
            .collect()
    }

    /// The series split into runs of consecutive present values, so a
    /// missing value leaves a gap in the drawn line.
    pub fn segments(&self, series: Series) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for sample in &self.samples {
            match Self::point(sample, series) {
                Some(p) => current.push(p),
                None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::{HydrographModel, HydrographSample, Series};
    use foundation::Timestamp;
    use pretty_assertions::assert_eq;

    fn sample(ts: &str, forecast: f64, analysis: f64, observation: Option<f64>) -> HydrographSample {
        HydrographSample {
            timestamp: Timestamp::parse(ts).unwrap(),
            forecast: Some(forecast),
            analysis: Some(analysis),
            observation,
            forecast_band: None,
            analysis_band: None,
        }
    }

    #[test]
    fn sorted_with_niced_domain() {
        let model = HydrographModel::build(vec![
            sample("2019060106", 3.2, 2.9, None),
            sample("2019060100", 1.1, 1.4, None),
        ])
        .unwrap();
        assert_eq!(model.samples[0].timestamp, Timestamp::parse("2019060100").unwrap());
        assert_eq!(model.x_domain.1 - model.x_domain.0, 6.0);
        assert_eq!(model.y_domain, (1.0, 3.2));
        assert!(!model.has_observations);
    }

    #[test]
    fn observations_widen_the_domain() {
        let model = HydrographModel::build(vec![
            sample("2019060100", 1.0, 1.0, Some(8.0)),
            sample("2019060106", 2.0, 2.0, None),
        ])
        .unwrap();
        assert!(model.has_observations);
        assert_eq!(model.y_domain, (1.0, 8.0));
        assert_eq!(model.series(Series::Observation).len(), 1);
        assert_eq!(model.series(Series::Forecast).len(), 2);
    }

    #[test]
    fn empty_series_has_no_model() {
        assert!(HydrographModel::build(Vec::new()).is_none());
    }

    #[test]
    fn missing_values_split_the_line() {
        let mut gap = sample("2019060102", 0.0, 2.0, None);
        gap.forecast = None;
        let model = HydrographModel::build(vec![
            sample("2019060100", 1.0, 1.0, None),
            sample("2019060101", 1.5, 1.2, None),
            gap,
            sample("2019060103", 2.5, 2.2, None),
        ])
        .unwrap();
        let runs = model.segments(Series::Forecast);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1].len(), 1);
        assert_eq!(model.segments(Series::Analysis).len(), 1);
        assert_eq!(model.series(Series::Forecast).len(), 3);
        assert_eq!(model.y_domain, (1.0, 2.5));
    }

    #[test]
    fn all_missing_has_no_model() {
        let mut empty = sample("2019060100", 0.0, 0.0, None);
        empty.forecast = None;
        empty.analysis = None;
        assert!(HydrographModel::build(vec![empty]).is_none());
    }
}
