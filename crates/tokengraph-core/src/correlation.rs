//! Time-aligned Pearson correlation over log-return series.
//!
//! Two series are aligned with a merge join on timestamps: the cursor holding
//! the earlier timestamp advances, and a pair is accumulated only when both
//! cursors sit on the same timestamp. The result does not depend on argument
//! order, so `correlate(a, b) == correlate(b, a)`.

use crate::LogReturnPoint;

/// Outcome of correlating two series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Pearson coefficient in `[-1, 1]`; exactly `0.0` when `degenerate`.
    pub value: f64,
    /// Number of timestamp-aligned pairs that were accumulated.
    pub measurements: usize,
    /// True when either side had zero variance (or fewer than two pairs).
    pub degenerate: bool,
}

impl Correlation {
    const fn degenerate(measurements: usize) -> Self {
        Self {
            value: 0.0,
            measurements,
            degenerate: true,
        }
    }
}

/// Running means and mean-centred co-moments (Welford's update).
///
/// Deviations are taken from the running means, so a small spread around a
/// large level keeps its precision, and a constant series accumulates a
/// variance of exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PearsonAccumulator {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    m2_x: f64,
    m2_y: f64,
    c_xy: f64,
}

impl PearsonAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.n += 1;
        let n = self.n as f64;
        let dx = x - self.mean_x;
        let dy = y - self.mean_y;
        self.mean_x += dx / n;
        self.mean_y += dy / n;

        // (n - 1) / n * dx * dy, written so swapping x and y is bit-identical.
        let weight = (n - 1.0) / n;
        self.c_xy += dx * dy * weight;
        self.m2_x += dx * dx * weight;
        self.m2_y += dy * dy * weight;
    }

    pub fn count(&self) -> usize {
        self.n
    }

    /// `r = Σdx·dy / sqrt(Σdx² · Σdy²)` over deviations from the means.
    ///
    /// The division only runs when both centred variances are non-zero;
    /// otherwise the result is a degenerate `0.0`.
    pub fn finish(&self) -> Correlation {
        if self.n < 2 || !is_positive(self.m2_x) || !is_positive(self.m2_y) {
            return Correlation::degenerate(self.n);
        }

        let denominator = (self.m2_x * self.m2_y).sqrt();
        if !is_positive(denominator) {
            return Correlation::degenerate(self.n);
        }

        let value = self.c_xy / denominator;
        if !value.is_finite() {
            return Correlation::degenerate(self.n);
        }

        Correlation {
            value: value.clamp(-1.0, 1.0),
            measurements: self.n,
            degenerate: false,
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Iterator over `(a.value, b.value)` for every timestamp present in both
/// series. Both inputs must be sorted by time with unique timestamps.
#[derive(Debug, Clone)]
pub struct AlignedPairs<'a> {
    a: &'a [LogReturnPoint],
    b: &'a [LogReturnPoint],
    i: usize,
    j: usize,
}

impl<'a> AlignedPairs<'a> {
    pub fn new(a: &'a [LogReturnPoint], b: &'a [LogReturnPoint]) -> Self {
        Self { a, b, i: 0, j: 0 }
    }
}

impl Iterator for AlignedPairs<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.i < self.a.len() && self.j < self.b.len() {
            let left = self.a[self.i];
            let right = self.b[self.j];
            if left.time < right.time {
                self.i += 1;
            } else if right.time < left.time {
                self.j += 1;
            } else {
                self.i += 1;
                self.j += 1;
                return Some((left.value, right.value));
            }
        }
        None
    }
}

/// Pearson correlation of two return series over their common timestamps.
pub fn correlate(a: &[LogReturnPoint], b: &[LogReturnPoint]) -> Correlation {
    AlignedPairs::new(a, b)
        .fold(PearsonAccumulator::new(), |mut acc, (x, y)| {
            acc.push(x, y);
            acc
        })
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(u64, f64)]) -> Vec<LogReturnPoint> {
        points
            .iter()
            .map(|&(time, value)| LogReturnPoint { time, value })
            .collect()
    }

    #[test]
    fn aligned_pairs_only_emit_common_timestamps() {
        let a = series(&[(1, 0.1), (2, 0.2), (4, 0.4), (5, 0.5)]);
        let b = series(&[(0, 9.0), (2, 2.0), (3, 3.0), (5, 5.0), (6, 6.0)]);

        let pairs: Vec<(f64, f64)> = AlignedPairs::new(&a, &b).collect();

        assert_eq!(pairs, vec![(0.2, 2.0), (0.5, 5.0)]);
    }

    #[test]
    fn perfectly_linear_series_correlate_to_one() {
        let a = series(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let b = series(&[(1, -2.0), (2, -4.0), (3, -6.0)]);

        let result = correlate(&a, &b);

        assert!((result.value + 1.0).abs() < 1e-12);
        assert_eq!(result.measurements, 3);
        assert!(!result.degenerate);
    }

    #[test]
    fn constant_series_is_degenerate_zero() {
        let a = series(&[(1, 0.3), (2, 0.3), (3, 0.3), (4, 0.3)]);
        let b = series(&[(1, 0.1), (2, -0.2), (3, 0.4), (4, 0.0)]);

        let result = correlate(&a, &b);

        assert_eq!(result.value, 0.0);
        assert!(result.degenerate);
        assert_eq!(result.measurements, 4);
    }

    #[test]
    fn disjoint_series_have_no_measurements() {
        let a = series(&[(1, 0.1), (3, 0.2)]);
        let b = series(&[(2, 0.1), (4, 0.2)]);

        let result = correlate(&a, &b);

        assert_eq!(
            result,
            Correlation {
                value: 0.0,
                measurements: 0,
                degenerate: true
            }
        );
    }

    #[test]
    fn constant_series_accumulates_exactly_zero_variance() {
        let mut acc = PearsonAccumulator::new();
        for y in [0.4, -0.1, 0.3] {
            acc.push(0.05, y);
        }

        assert_eq!(acc.m2_x, 0.0);
        assert_eq!(acc.c_xy, 0.0);
        assert!(acc.finish().degenerate);
    }

    #[test]
    fn single_pair_is_degenerate() {
        let mut acc = PearsonAccumulator::new();
        acc.push(1.0, 2.0);

        assert_eq!(acc.count(), 1);
        assert!(acc.finish().degenerate);
    }
}
