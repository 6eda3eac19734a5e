//! Backtest report assembly — a run result joined with its derived metrics
//! and identifying metadata, ready for serialization or risk analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quantlab_core::domain::{BacktestConfig, Bar, ConfigHash, RunId};
use quantlab_core::engine::{run_backtest, RunResult};
use quantlab_core::error::BacktestError;

use crate::metrics::PerformanceMetrics;

/// Everything a completed backtest produces. Immutable after creation;
/// round-trips through serde with identical numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub run_id: RunId,
    pub config_hash: ConfigHash,
    pub symbol: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Result content categories present in this report.
    pub data_types_included: Vec<String>,
    pub result: RunResult,
    pub metrics: PerformanceMetrics,
}

impl BacktestReport {
    /// Run the executor over `bars` and derive metrics in one step.
    pub fn generate(
        bars: &[Bar],
        config: &BacktestConfig,
        risk_free_rate: f64,
    ) -> Result<Self, BacktestError> {
        let result = run_backtest(bars, config)?;
        Ok(Self::from_result(config, bars, result, risk_free_rate))
    }

    /// Wrap an already-computed run result.
    pub fn from_result(
        config: &BacktestConfig,
        bars: &[Bar],
        result: RunResult,
        risk_free_rate: f64,
    ) -> Self {
        let metrics = PerformanceMetrics::compute(&result.equity, &result.trades, risk_free_rate);
        let config_hash = result.config_hash;
        let dataset_hash = hash_bars(bars);
        let mut data_types_included =
            vec!["equity_curve".to_string(), "metrics".to_string()];
        if !result.trades.is_empty() {
            data_types_included.push("trades".to_string());
        }
        if !result.events.is_empty() {
            data_types_included.push("events".to_string());
        }

        Self {
            run_id: RunId::derive(&config_hash, &dataset_hash),
            config_hash,
            symbol: config.symbol.clone(),
            period_start: result.equity.first().timestamp,
            period_end: result.equity.last().timestamp,
            data_types_included,
            result,
            metrics,
        }
    }
}

/// Dataset identity: hash of every bar's timestamp and close.
fn hash_bars(bars: &[Bar]) -> ConfigHash {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
    }
    ConfigHash(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use quantlab_core::data::{BarSource, SyntheticSource};
    use quantlab_core::domain::StrategyParams;

    fn sample() -> (Vec<Bar>, BacktestConfig) {
        let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let bars = SyntheticSource::new(42)
            .bars(start, start + Duration::days(300))
            .unwrap();
        let config = BacktestConfig::new(
            "SYN",
            StrategyParams::MaCrossover {
                fast_period: 10,
                slow_period: 30,
            },
            10_000.0,
        );
        (bars, config)
    }

    #[test]
    fn report_carries_period_bounds() {
        let (bars, config) = sample();
        let report = BacktestReport::generate(&bars, &config, 0.02).unwrap();
        assert_eq!(report.period_start, bars[0].timestamp);
        assert_eq!(report.period_end, bars[bars.len() - 1].timestamp);
        assert!(report.data_types_included.contains(&"metrics".to_string()));
    }

    #[test]
    fn run_id_changes_with_dataset() {
        let (bars, config) = sample();
        let a = BacktestReport::generate(&bars, &config, 0.0).unwrap();
        let b = BacktestReport::generate(&bars[..200], &config, 0.0).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn report_roundtrips_through_serde() {
        let (bars, config) = sample();
        let report = BacktestReport::generate(&bars, &config, 0.02).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let deser: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, deser);
    }
}
