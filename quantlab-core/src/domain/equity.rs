//! Equity curve — the time series a run produces and metrics consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

/// Ordered sequence of (timestamp, equity) points.
///
/// Invariants maintained by the engine: timestamps strictly ascending,
/// length >= 1 (the initial capital point is always present).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
}

impl EquityCurve {
    pub fn new(initial: EquityPoint) -> Self {
        Self {
            points: vec![initial],
        }
    }

    /// Build from pre-sorted points. Callers guarantee ordering.
    pub fn from_points(points: Vec<EquityPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        debug_assert!(!points.is_empty());
        Self { points }
    }

    pub fn push(&mut self, point: EquityPoint) {
        debug_assert!(
            self.points
                .last()
                .map(|p| p.timestamp < point.timestamp)
                .unwrap_or(true),
            "equity points must be appended in ascending timestamp order"
        );
        self.points.push(point);
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &EquityPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &EquityPoint {
        self.points.last().expect("equity curve is never empty")
    }

    /// Equity values only, in order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity).collect()
    }

    /// Simple periodic returns: (e[i+1] - e[i]) / e[i].
    ///
    /// A zero or negative denominator yields a 0.0 return rather than a
    /// NaN that would poison every downstream statistic.
    pub fn returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| {
                if w[0].equity > 0.0 {
                    (w[1].equity - w[0].equity) / w[0].equity
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// Elapsed calendar time in years between first and last point.
    pub fn elapsed_years(&self) -> f64 {
        let secs = (self.last().timestamp - self.first().timestamp).num_seconds() as f64;
        secs / (365.25 * 24.0 * 3600.0)
    }

    /// Observation frequency in periods per year, inferred from the median
    /// spacing between points. Falls back to 252 (daily bars) when the curve
    /// is too short to infer anything.
    pub fn periods_per_year(&self) -> f64 {
        if self.points.len() < 3 {
            return 252.0;
        }
        let mut gaps: Vec<i64> = self
            .points
            .windows(2)
            .map(|w| (w[1].timestamp - w[0].timestamp).num_seconds())
            .collect();
        gaps.sort_unstable();
        let median = gaps[gaps.len() / 2] as f64;
        if median <= 0.0 {
            return 252.0;
        }
        365.25 * 24.0 * 3600.0 / median
    }
}
