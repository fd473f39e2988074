use serde::{Deserialize, Serialize};

use crate::math::ticks::{nice, ticks};

/// Continuous linear map from a value domain to a pixel range.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    /// Maps `v`; a collapsed domain maps everything to the range midpoint.
    pub fn apply(&self, v: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        let t = if span == 0.0 { 0.5 } else { (v - d0) / span };
        r0 + t * (r1 - r0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = r1 - r0;
        let t = if span == 0.0 { 0.5 } else { (px - r0) / span };
        d0 + t * (d1 - d0)
    }

    /// Domain extended to round tick boundaries.
    pub fn nice(self, count: usize) -> Self {
        let (d0, d1) = nice(self.domain[0], self.domain[1], count);
        Self {
            domain: [d0, d1],
            ..self
        }
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain[0], self.domain[1], count)
    }
}

#[cfg(test)]
mod tests {
    use super::LinearScale;

    #[test]
    fn maps_and_inverts() {
        let s = LinearScale::new([0.0, 10.0], [0.5, 10.0]);
        assert_eq!(s.apply(0.0), 0.5);
        assert_eq!(s.apply(10.0), 10.0);
        assert!((s.invert(s.apply(3.3)) - 3.3).abs() < 1e-12);
    }

    #[test]
    fn inverted_range_for_y_axes() {
        let s = LinearScale::new([0.0, 20.0], [200.0, 0.0]);
        assert_eq!(s.apply(5.0), 150.0);
    }

    #[test]
    fn collapsed_domain_maps_to_midpoint() {
        let s = LinearScale::new([4.0, 4.0], [0.0, 10.0]);
        assert_eq!(s.apply(4.0), 5.0);
        assert_eq!(s.apply(100.0), 5.0);
    }

    #[test]
    fn nice_rounds_domain() {
        let s = LinearScale::new([0.13, 9.7], [0.0, 1.0]).nice(10);
        assert_eq!(s.domain, [0.0, 10.0]);
        assert_eq!(s.ticks(5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }
}
