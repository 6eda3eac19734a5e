//! Risk & stress simulator.
//!
//! Everything here is a pure function of a completed backtest and an explicit
//! config: VaR/CVaR estimation, drawdown decomposition, distribution shape
//! statistics, named stress scenarios, and Monte Carlo forward simulation.
//! No hidden state, no I/O.

pub mod drawdown;
pub mod monte_carlo;
pub mod stress;
pub mod var;

pub use drawdown::{drawdown_periods, DrawdownPeriod};
pub use monte_carlo::{ForwardSimConfig, ForwardSimSummary, OutcomePercentiles, PathMode};
pub use stress::{run_stress_tests, standard_scenarios, StressOutcome, StressScenario};
pub use var::{VarEstimate, VarMethod};

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::report::BacktestReport;

/// Normal draw via Box-Muller, driven by the caller's seeded RNG.
pub(crate) fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// What to compute and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub confidence_levels: Vec<f64>,
    pub methods: Vec<VarMethod>,
    pub scenarios: Vec<StressScenario>,
    /// `None` skips forward simulation.
    pub forward_sim: Option<ForwardSimConfig>,
    pub seed: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confidence_levels: vec![0.95, 0.99],
            methods: vec![
                VarMethod::Historical,
                VarMethod::Parametric,
                VarMethod::MonteCarlo,
            ],
            scenarios: standard_scenarios(),
            forward_sim: Some(ForwardSimConfig::default()),
            seed: 42,
        }
    }
}

/// Complete risk analysis for one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    /// One estimate per (method, confidence level) pair that was computable.
    pub var_estimates: Vec<VarEstimate>,
    pub drawdown_periods: Vec<DrawdownPeriod>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub stress: Vec<StressOutcome>,
    pub monte_carlo: Option<ForwardSimSummary>,
}

impl RiskReport {
    /// Analyze a completed backtest under the given config.
    pub fn generate(report: &BacktestReport, config: &RiskConfig) -> Self {
        let returns = report.result.equity.returns();

        let mut var_estimates = Vec::new();
        for &method in &config.methods {
            for &confidence in &config.confidence_levels {
                if let Some(est) = var::estimate(&returns, method, confidence, config.seed) {
                    var_estimates.push(est);
                }
            }
        }

        Self {
            var_estimates,
            drawdown_periods: drawdown_periods(&report.result.equity),
            skewness: skewness(&returns),
            kurtosis: excess_kurtosis(&returns),
            stress: run_stress_tests(&returns, &config.scenarios),
            monte_carlo: config
                .forward_sim
                .as_ref()
                .and_then(|fs| monte_carlo::run_forward_sim(&returns, fs)),
        }
    }
}

// ─── Distribution shape ─────────────────────────────────────────────

/// Third standardized moment. `None` below 3 observations or at zero
/// dispersion.
pub fn skewness(returns: &[f64]) -> Option<f64> {
    let n = returns.len();
    if n < 3 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / n as f64;
    let m2 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;
    if m2 <= 0.0 {
        return None;
    }
    let m3 = returns.iter().map(|r| (r - mean).powi(3)).sum::<f64>() / n as f64;
    Some(m3 / m2.powf(1.5))
}

/// Fourth standardized moment minus 3. `None` below 4 observations or at
/// zero dispersion.
pub fn excess_kurtosis(returns: &[f64]) -> Option<f64> {
    let n = returns.len();
    if n < 4 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / n as f64;
    let m2 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n as f64;
    if m2 <= 0.0 {
        return None;
    }
    let m4 = returns.iter().map(|r| (r - mean).powi(4)).sum::<f64>() / n as f64;
    Some(m4 / (m2 * m2) - 3.0)
}
