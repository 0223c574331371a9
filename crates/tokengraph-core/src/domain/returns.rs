use serde::{Deserialize, Serialize};

use super::OhlcSample;
use crate::CoreError;

/// One log-return, stamped with the time of the later of its two samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogReturnPoint {
    pub time: u64,
    pub value: f64,
}

/// Log-return series derived from a time-sorted sample sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    points: Vec<LogReturnPoint>,
    skipped_points: usize,
}

impl ReturnSeries {
    /// Derives `ln(mid[i] / mid[i-1])` for every consecutive pair of samples.
    ///
    /// A pair whose midpoints are not both finite and strictly positive has no
    /// defined ratio; it produces no point and is counted in
    /// [`skipped_points`](Self::skipped_points) instead.
    pub fn from_samples(samples: &[OhlcSample]) -> Self {
        let mut points = Vec::with_capacity(samples.len().saturating_sub(1));
        let mut skipped_points = 0;

        for pair in samples.windows(2) {
            let previous = pair[0].mid();
            let current = pair[1].mid();

            if !is_usable_price(previous) || !is_usable_price(current) {
                skipped_points += 1;
                continue;
            }

            let value = (current / previous).ln();
            if value.is_finite() {
                points.push(LogReturnPoint {
                    time: pair[1].time,
                    value,
                });
            } else {
                skipped_points += 1;
            }
        }

        Self {
            points,
            skipped_points,
        }
    }

    pub fn from_points(points: Vec<LogReturnPoint>) -> Self {
        Self {
            points,
            skipped_points: 0,
        }
    }

    pub fn points(&self) -> &[LogReturnPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn skipped_points(&self) -> usize {
        self.skipped_points
    }

    /// Arithmetic mean of the return values; `None` for an empty series.
    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum: f64 = self.points.iter().map(|point| point.value).sum();
        Some(sum / self.points.len() as f64)
    }

    /// Mean, or [`CoreError::NumericDegenerate`] when there is nothing to average.
    pub fn require_mean(&self, unit: &str) -> Result<f64, CoreError> {
        self.mean().ok_or_else(|| {
            CoreError::numeric_degenerate(
                unit,
                format!(
                    "no usable log-returns ({} skipped); needs two positive midpoints",
                    self.skipped_points
                ),
            )
        })
    }
}

fn is_usable_price(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(time: u64, price: f64) -> OhlcSample {
        OhlcSample::new(time, price, price, price, price, 0.0).expect("valid sample")
    }

    #[test]
    fn returns_have_one_point_fewer_than_samples() {
        let samples = [flat(0, 1.0), flat(60, 2.0), flat(120, 1.0)];
        let series = ReturnSeries::from_samples(&samples);

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].time, 60);
        assert!((series.points()[0].value - 2.0_f64.ln()).abs() < 1e-15);
        assert!((series.points()[1].value + 2.0_f64.ln()).abs() < 1e-15);
        assert!(series.mean().expect("mean").abs() < 1e-15);
    }

    #[test]
    fn single_sample_has_no_mean() {
        let series = ReturnSeries::from_samples(&[flat(0, 5.0)]);

        assert!(series.is_empty());
        assert_eq!(series.mean(), None);
        assert!(matches!(
            series.require_mean("abc"),
            Err(CoreError::NumericDegenerate { .. })
        ));
    }

    #[test]
    fn zero_midpoint_skips_both_adjacent_returns() {
        let samples = [flat(0, 1.0), flat(1, 0.0), flat(2, 4.0), flat(3, 8.0)];
        let series = ReturnSeries::from_samples(&samples);

        assert_eq!(series.skipped_points(), 2);
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].time, 3);
        assert!((series.points()[0].value - 2.0_f64.ln()).abs() < 1e-15);
    }
}
