//! Value-at-Risk and Conditional Value-at-Risk.
//!
//! Three interchangeable estimation methods over a realized return series.
//! Loss-signed convention throughout: VaR and CVaR are negative numbers for
//! losing tails, and `CVaR <= VaR` always holds (the tail mean cannot be
//! better than its own threshold).

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use super::sample_normal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarMethod {
    /// Empirical quantile of the realized returns.
    Historical,
    /// Normal assumption: `mean + z(1-c) * stdev`.
    Parametric,
    /// Quantile of simulated outcomes (parametric draws by default).
    MonteCarlo,
}

/// One VaR/CVaR estimate at a single confidence level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarEstimate {
    pub method: VarMethod,
    pub confidence: f64,
    pub var: f64,
    pub cvar: f64,
}

/// Estimate VaR and CVaR with the given method. `None` when the return
/// series is empty or the confidence level is out of (0, 1).
pub fn estimate(
    returns: &[f64],
    method: VarMethod,
    confidence: f64,
    seed: u64,
) -> Option<VarEstimate> {
    if returns.is_empty() || !(0.0..1.0).contains(&confidence) || confidence <= 0.0 {
        return None;
    }
    let var = match method {
        VarMethod::Historical => historical_var(returns, confidence)?,
        VarMethod::Parametric => parametric_var(returns, confidence)?,
        VarMethod::MonteCarlo => monte_carlo_var(returns, confidence, 10_000, seed)?,
    };
    let cvar = cvar_at(returns, var);
    Some(VarEstimate {
        method,
        confidence,
        var,
        cvar,
    })
}

/// Empirical (1 - confidence) quantile: sort ascending, take index
/// `floor((1 - c) * n)`.
pub fn historical_var(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = (((1.0 - confidence) * sorted.len() as f64).floor() as usize)
        .min(sorted.len() - 1);
    Some(sorted[idx])
}

/// Normal-assumption VaR: `mean + z(1 - c) * stdev`, where z is the standard
/// normal quantile (negative for the loss tail).
pub fn parametric_var(returns: &[f64], confidence: f64) -> Option<f64> {
    let (mean, std) = mean_std(returns)?;
    let normal = Normal::new(0.0, 1.0).ok()?;
    let z = normal.inverse_cdf(1.0 - confidence);
    Some(mean + z * std)
}

/// Simulated VaR: draw `n_paths` returns from a normal fitted to the series
/// and take the empirical quantile of the draws.
pub fn monte_carlo_var(
    returns: &[f64],
    confidence: f64,
    n_paths: usize,
    seed: u64,
) -> Option<f64> {
    let (mean, std) = mean_std(returns)?;
    if n_paths == 0 {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let simulated: Vec<f64> = (0..n_paths)
        .map(|_| sample_normal(&mut rng, mean, std))
        .collect();
    historical_var(&simulated, confidence)
}

/// CVaR: mean of returns at or beyond the VaR threshold. Falls back to the
/// threshold itself if nothing in the series breaches it (a parametric VaR
/// can sit below every observation).
pub fn cvar_at(returns: &[f64], var: f64) -> f64 {
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    if tail.is_empty() {
        return var;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

fn mean_std(returns: &[f64]) -> Option<(f64, f64)> {
    if returns.len() < 2 {
        return None;
    }
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    Some((mean, var.sqrt()))
}
