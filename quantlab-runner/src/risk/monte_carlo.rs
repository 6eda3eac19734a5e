//! Monte Carlo forward simulation.
//!
//! Projects the realized return distribution `horizon` periods forward over
//! `n_paths` independent paths. Paths are embarrassingly parallel: each owns
//! an RNG derived from (seed, path index) via the core seed hierarchy, so the
//! outcome is identical regardless of how rayon schedules the work. Results
//! are joined once and folded by a single writer.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use quantlab_core::rng::SeedHierarchy;

use super::sample_normal;

/// How per-period returns are drawn along a simulated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Normal fitted to the realized mean/stdev.
    Parametric,
    /// Resample realized returns with replacement.
    Bootstrap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardSimConfig {
    /// Periods to project forward.
    pub horizon: usize,
    pub n_paths: usize,
    pub mode: PathMode,
    pub seed: u64,
}

impl Default for ForwardSimConfig {
    fn default() -> Self {
        Self {
            horizon: 252,
            n_paths: 1_000,
            mode: PathMode::Parametric,
            seed: 42,
        }
    }
}

/// Percentiles of the simulated outcome distribution. Monotone by
/// construction: all fields are read off one sorted vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomePercentiles {
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardSimSummary {
    pub horizon: usize,
    pub n_paths: usize,
    pub mode: PathMode,
    /// All simulated total returns, sorted ascending.
    pub outcomes: Vec<f64>,
    pub percentiles: OutcomePercentiles,
    pub expected_value: f64,
    /// Mean of the worst 5% of outcomes.
    pub worst_tail_mean: f64,
}

/// Simulate `config.n_paths` forward paths from the realized return series.
/// `None` when the series is too short to fit or resample, or the config is
/// degenerate.
pub fn run_forward_sim(returns: &[f64], config: &ForwardSimConfig) -> Option<ForwardSimSummary> {
    if returns.len() < 2 || config.horizon == 0 || config.n_paths == 0 {
        return None;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std = variance.sqrt();
    let seeds = SeedHierarchy::new(config.seed);

    let mut outcomes: Vec<f64> = (0..config.n_paths as u64)
        .into_par_iter()
        .map(|path| {
            let mut rng = seeds.rng_for("mc_path", path);
            let mut value = 1.0f64;
            for _ in 0..config.horizon {
                let r = match config.mode {
                    PathMode::Parametric => sample_normal(&mut rng, mean, std),
                    PathMode::Bootstrap => returns[rng.gen_range(0..returns.len())],
                };
                value *= 1.0 + r;
                if value <= 0.0 {
                    value = 0.0;
                    break;
                }
            }
            value - 1.0
        })
        .collect();

    outcomes.sort_by(|a, b| a.total_cmp(b));
    let expected_value = outcomes.iter().sum::<f64>() / outcomes.len() as f64;
    let tail_len = ((outcomes.len() as f64 * 0.05).ceil() as usize).max(1);
    let worst_tail_mean = outcomes[..tail_len].iter().sum::<f64>() / tail_len as f64;

    Some(ForwardSimSummary {
        horizon: config.horizon,
        n_paths: config.n_paths,
        mode: config.mode,
        percentiles: OutcomePercentiles {
            p5: percentile_sorted(&outcomes, 0.05),
            p10: percentile_sorted(&outcomes, 0.10),
            p25: percentile_sorted(&outcomes, 0.25),
            p50: percentile_sorted(&outcomes, 0.50),
            p75: percentile_sorted(&outcomes, 0.75),
            p90: percentile_sorted(&outcomes, 0.90),
            p95: percentile_sorted(&outcomes, 0.95),
        },
        expected_value,
        worst_tail_mean,
        outcomes,
    })
}

/// Linear-interpolation percentile over an ascending-sorted slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_returns() -> Vec<f64> {
        (0..252).map(|i| ((i % 13) as f64 - 6.0) * 0.003).collect()
    }

    fn assert_percentiles_monotone(p: &OutcomePercentiles) {
        let seq = [p.p5, p.p10, p.p25, p.p50, p.p75, p.p90, p.p95];
        assert!(seq.windows(2).all(|w| w[0] <= w[1]), "{seq:?}");
    }

    #[test]
    fn percentiles_are_monotone_for_both_modes() {
        let returns = sample_returns();
        for mode in [PathMode::Parametric, PathMode::Bootstrap] {
            let config = ForwardSimConfig {
                horizon: 50,
                n_paths: 500,
                mode,
                seed: 42,
            };
            let summary = run_forward_sim(&returns, &config).unwrap();
            assert_percentiles_monotone(&summary.percentiles);
            assert!(summary.outcomes.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn simulation_is_deterministic_across_repeats() {
        let returns = sample_returns();
        let config = ForwardSimConfig::default();
        let a = run_forward_sim(&returns, &config).unwrap();
        let b = run_forward_sim(&returns, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn worst_tail_mean_bounded_by_p5() {
        let returns = sample_returns();
        let summary = run_forward_sim(&returns, &ForwardSimConfig::default()).unwrap();
        assert!(summary.worst_tail_mean <= summary.percentiles.p5 + 1e-9);
    }

    #[test]
    fn positive_drift_lifts_expected_value() {
        let up: Vec<f64> = (0..252).map(|i| 0.002 + ((i % 5) as f64 - 2.0) * 0.001).collect();
        let config = ForwardSimConfig {
            horizon: 100,
            n_paths: 500,
            mode: PathMode::Bootstrap,
            seed: 7,
        };
        let summary = run_forward_sim(&up, &config).unwrap();
        assert!(summary.expected_value > 0.0);
    }

    #[test]
    fn degenerate_inputs_yield_none() {
        assert!(run_forward_sim(&[], &ForwardSimConfig::default()).is_none());
        let cfg = ForwardSimConfig {
            n_paths: 0,
            ..ForwardSimConfig::default()
        };
        assert!(run_forward_sim(&sample_returns(), &cfg).is_none());
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert!((percentile_sorted(&sorted, 0.5) - 2.0).abs() < 1e-12);
        assert!((percentile_sorted(&sorted, 0.125) - 0.5).abs() < 1e-12);
    }
}
