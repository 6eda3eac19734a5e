//! Performance metrics — pure functions from an equity curve and trade list.
//!
//! No dependencies on the optimizer or risk simulator; everything here is
//! (curve, trades, risk_free_rate) in, numbers out. Ratio metrics that are
//! mathematically undefined come back as `None`, never coerced to 0.0 —
//! the optimizer must not mistake "no volatility" for "no edge".

use serde::{Deserialize, Serialize};

use quantlab_core::domain::{EquityCurve, TradeRecord};

/// Aggregate performance metrics for a single run.
///
/// `insufficient_data` is set when the curve has fewer than two points; in
/// that case every ratio is `None` and every scalar is 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    /// Geometric annualized return over the exact elapsed calendar period.
    pub annual_return: f64,
    /// Annualized standard deviation of periodic returns.
    pub volatility: f64,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub calmar: Option<f64>,
    /// Largest peak-to-trough decline, as a positive fraction.
    pub max_drawdown: f64,
    /// Mean drawdown across all observations, positive fraction.
    pub avg_drawdown: f64,
    pub win_rate: f64,
    /// Gross profit over gross loss; `None` when there are profits but no
    /// losses (the ratio is unbounded, and JSON cannot carry infinity).
    pub profit_factor: Option<f64>,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub insufficient_data: bool,
}

impl PerformanceMetrics {
    /// Compute all metrics. `risk_free_rate` is annualized (e.g. 0.02).
    pub fn compute(curve: &EquityCurve, trades: &[TradeRecord], risk_free_rate: f64) -> Self {
        if curve.len() < 2 {
            return Self::insufficient(trades);
        }

        let values = curve.values();
        let returns = curve.returns();
        let ppy = curve.periods_per_year();
        let years = curve.elapsed_years();

        let winning = trades.iter().filter(|t| t.is_winner()).count();
        let losing = trades.len() - winning;

        Self {
            total_return: total_return(&values),
            annual_return: annual_return(&values, years),
            volatility: annualized_volatility(&returns, ppy),
            sharpe: sharpe_ratio(&returns, risk_free_rate, ppy),
            sortino: sortino_ratio(&returns, risk_free_rate, ppy),
            calmar: calmar_ratio(&values, years),
            max_drawdown: max_drawdown(&values),
            avg_drawdown: avg_drawdown(&values),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            winning_trades: winning,
            losing_trades: losing,
            insufficient_data: false,
        }
    }

    fn insufficient(trades: &[TradeRecord]) -> Self {
        let winning = trades.iter().filter(|t| t.is_winner()).count();
        Self {
            total_return: 0.0,
            annual_return: 0.0,
            volatility: 0.0,
            sharpe: None,
            sortino: None,
            calmar: None,
            max_drawdown: 0.0,
            avg_drawdown: 0.0,
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            winning_trades: winning,
            losing_trades: trades.len() - winning,
            insufficient_data: true,
        }
    }
}

// ─── Return metrics ─────────────────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let initial = values[0];
    if initial <= 0.0 {
        return 0.0;
    }
    (values[values.len() - 1] - initial) / initial
}

/// Geometric annualized return over the exact elapsed calendar period:
/// `(final/initial)^(1/years) - 1`. Not a linear day-count approximation.
pub fn annual_return(values: &[f64], elapsed_years: f64) -> f64 {
    if values.len() < 2 || elapsed_years <= 0.0 {
        return 0.0;
    }
    let initial = values[0];
    let last = values[values.len() - 1];
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    (last / initial).powf(1.0 / elapsed_years) - 1.0
}

// ─── Risk metrics ───────────────────────────────────────────────────

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn std_dev(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    let var = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64;
    var.sqrt()
}

/// Annualized volatility: per-period std × √(periods/year).
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    std_dev(returns) * periods_per_year.sqrt()
}

/// Annualized Sharpe ratio:
/// `(mean(r) - rf/periods) / std(r) * sqrt(periods)`.
///
/// `None` when the return series is too short or has zero volatility.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let vol = std_dev(returns);
    if vol <= 0.0 {
        return None;
    }
    let excess = mean(returns) - risk_free_rate / periods_per_year;
    Some(excess / vol * periods_per_year.sqrt())
}

/// Sortino ratio: Sharpe numerator over downside deviation only.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let target = risk_free_rate / periods_per_year;
    let downside: Vec<f64> = returns
        .iter()
        .map(|r| (r - target).min(0.0))
        .collect();
    let downside_dev =
        (downside.iter().map(|d| d * d).sum::<f64>() / downside.len() as f64).sqrt();
    if downside_dev <= 0.0 {
        return None;
    }
    let excess = mean(returns) - target;
    Some(excess / downside_dev * periods_per_year.sqrt())
}

/// Calmar ratio: annual return over |max drawdown|. `None` when the curve
/// never drew down.
pub fn calmar_ratio(values: &[f64], elapsed_years: f64) -> Option<f64> {
    let mdd = max_drawdown(values);
    if mdd <= 0.0 {
        return None;
    }
    Some(annual_return(values, elapsed_years) / mdd)
}

/// Maximum peak-to-trough decline as a positive fraction of the peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.max((peak - v) / peak);
        }
    }
    worst
}

/// Mean per-observation drawdown from the running peak, positive fraction.
/// Always `<= max_drawdown`.
pub fn avg_drawdown(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut peak = f64::MIN;
    let mut sum = 0.0;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            sum += (peak - v) / peak;
        }
    }
    sum / values.len() as f64
}

// ─── Trade statistics ───────────────────────────────────────────────

pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// Gross profit / gross loss. `Some(0.0)` with no trades; `None` when there
/// are profits but no losses — the ratio is unbounded there, and an infinity
/// sentinel would not survive a JSON round trip.
pub fn profit_factor(trades: &[TradeRecord]) -> Option<f64> {
    let gross_profit: f64 = trades.iter().filter(|t| t.net_pnl > 0.0).map(|t| t.net_pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();
    if gross_loss > 0.0 {
        Some(gross_profit / gross_loss)
    } else if gross_profit > 0.0 {
        None
    } else {
        Some(0.0)
    }
}
