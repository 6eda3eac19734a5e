//! Drawdown decomposition — contiguous underwater intervals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quantlab_core::domain::EquityCurve;

/// One contiguous underwater interval: from the last peak, through the
/// trough, to recovery (if any). An interval still underwater at series end
/// has no recovery timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPeriod {
    /// Timestamp of the peak preceding the decline.
    pub start: DateTime<Utc>,
    pub trough: DateTime<Utc>,
    pub recovery: Option<DateTime<Utc>>,
    /// Depth at the trough as a positive fraction of the peak.
    pub depth: f64,
}

/// Extract all drawdown periods from an equity curve, in chronological order.
pub fn drawdown_periods(curve: &EquityCurve) -> Vec<DrawdownPeriod> {
    let points = curve.points();
    if points.len() < 2 {
        return Vec::new();
    }

    let mut periods = Vec::new();
    let mut peak = points[0];
    let mut current: Option<DrawdownPeriod> = None;

    for point in &points[1..] {
        if point.equity >= peak.equity {
            if let Some(mut period) = current.take() {
                period.recovery = Some(point.timestamp);
                periods.push(period);
            }
            peak = *point;
            continue;
        }

        let depth = if peak.equity > 0.0 {
            (peak.equity - point.equity) / peak.equity
        } else {
            0.0
        };
        match current.as_mut() {
            None => {
                current = Some(DrawdownPeriod {
                    start: peak.timestamp,
                    trough: point.timestamp,
                    recovery: None,
                    depth,
                });
            }
            Some(period) if depth > period.depth => {
                period.trough = point.timestamp;
                period.depth = depth;
            }
            Some(_) => {}
        }
    }

    // Still underwater at the end of the series.
    if let Some(period) = current {
        periods.push(period);
    }
    periods
}
