//! Optimization objectives — map a run's metrics to one scalar score.
//!
//! All objectives are maximized. An objective that is undefined for a given
//! run (e.g. Sharpe on a zero-volatility curve) yields `None`; the optimizer
//! treats that candidate as a failed evaluation rather than scoring it 0.

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    Sharpe,
    Sortino,
    Calmar,
    TotalReturn,
    AnnualReturn,
    /// Annual return penalized by max drawdown: `annual - max_drawdown`.
    ReturnOverDrawdown,
}

impl Objective {
    /// Score to maximize, or `None` when undefined for this run.
    pub fn score(&self, metrics: &PerformanceMetrics) -> Option<f64> {
        if metrics.insufficient_data {
            return None;
        }
        let value = match self {
            Self::Sharpe => metrics.sharpe?,
            Self::Sortino => metrics.sortino?,
            Self::Calmar => metrics.calmar?,
            Self::TotalReturn => metrics.total_return,
            Self::AnnualReturn => metrics.annual_return,
            Self::ReturnOverDrawdown => metrics.annual_return - metrics.max_drawdown,
        };
        value.is_finite().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with(sharpe: Option<f64>, total: f64) -> PerformanceMetrics {
        PerformanceMetrics {
            total_return: total,
            annual_return: total,
            volatility: 0.1,
            sharpe,
            sortino: sharpe,
            calmar: sharpe,
            max_drawdown: 0.05,
            avg_drawdown: 0.02,
            win_rate: 0.5,
            profit_factor: Some(1.2),
            trade_count: 10,
            winning_trades: 5,
            losing_trades: 5,
            insufficient_data: false,
        }
    }

    #[test]
    fn undefined_sharpe_yields_no_score() {
        assert_eq!(Objective::Sharpe.score(&metrics_with(None, 0.1)), None);
    }

    #[test]
    fn total_return_scores_even_without_sharpe() {
        assert_eq!(
            Objective::TotalReturn.score(&metrics_with(None, 0.1)),
            Some(0.1)
        );
    }

    #[test]
    fn insufficient_data_never_scores() {
        let mut m = metrics_with(Some(1.0), 0.1);
        m.insufficient_data = true;
        assert_eq!(Objective::TotalReturn.score(&m), None);
    }
}
