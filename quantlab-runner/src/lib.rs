//! QuantLab Runner — metrics, optimization, risk analytics.
//!
//! Sits on top of `quantlab-core`:
//! - Performance metrics (returns, Sharpe/Sortino/Calmar, drawdowns, trade stats)
//! - Parameter optimizer (grid / random / genetic / Bayesian, parallel
//!   evaluation, early stopping, post-optimization analysis)
//! - Risk & stress simulator (VaR/CVaR, stress scenarios, Monte Carlo
//!   forward simulation)
//! - Backtest report assembly and optimization progress reporting

pub mod metrics;
pub mod objective;
pub mod optimizer;
pub mod progress;
pub mod report;
pub mod risk;

pub use metrics::PerformanceMetrics;
pub use report::BacktestReport;
