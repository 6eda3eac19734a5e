//! Post-optimization analysis — parameter importance, stability of the
//! best result, and in-sample / out-of-sample overfitting detection.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use quantlab_core::domain::{BacktestConfig, Bar};
use quantlab_core::engine::run_backtest;
use quantlab_core::rng::SeedHierarchy;

use super::{apply_params, Evaluation, OptimizationConfig, ParamSet, ParameterRange};
use crate::metrics::PerformanceMetrics;

// ─── Parameter importance ────────────────────────────────────────────

/// Importance per dimension: absolute Pearson correlation between the
/// dimension's sampled values (unit-encoded) and the scores, normalized to
/// sum to 1. Dimensions with no variation get 0.
pub fn parameter_importance(
    ranges: &[ParameterRange],
    evaluations: &[Evaluation],
) -> BTreeMap<String, f64> {
    let mut raw = BTreeMap::new();
    if evaluations.len() < 3 {
        return raw;
    }
    let scores: Vec<f64> = evaluations.iter().map(|e| e.score).collect();

    for range in ranges {
        let xs: Vec<f64> = evaluations
            .iter()
            .map(|e| {
                e.params
                    .get(&range.name)
                    .map(|v| range.to_unit(v))
                    .unwrap_or(0.0)
            })
            .collect();
        raw.insert(range.name.clone(), pearson(&xs, &scores).abs());
    }

    let total: f64 = raw.values().sum();
    if total > 0.0 {
        for v in raw.values_mut() {
            *v /= total;
        }
    }
    raw
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        vx += (x - mx).powi(2);
        vy += (y - my).powi(2);
    }
    if vx <= 0.0 || vy <= 0.0 {
        return 0.0;
    }
    cov / (vx.sqrt() * vy.sqrt())
}

// ─── Stability ───────────────────────────────────────────────────────

/// How fragile the winner is: bootstrap resamples of the evaluation set,
/// each resample re-picking its own best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityMetrics {
    /// Standard deviation of the per-resample best scores.
    pub best_score_std: f64,
    /// Fraction of resamples whose best parameters equal the modal best.
    pub modal_agreement: f64,
    pub n_resamples: usize,
}

const STABILITY_RESAMPLES: usize = 200;

pub fn stability(evaluations: &[Evaluation], seed: u64) -> StabilityMetrics {
    if evaluations.is_empty() {
        return StabilityMetrics {
            best_score_std: 0.0,
            modal_agreement: 0.0,
            n_resamples: 0,
        };
    }

    let mut rng = SeedHierarchy::new(seed).rng_for("stability", 0);
    let mut best_scores = Vec::with_capacity(STABILITY_RESAMPLES);
    let mut best_params_counts: BTreeMap<String, usize> = BTreeMap::new();

    for _ in 0..STABILITY_RESAMPLES {
        let mut best: Option<&Evaluation> = None;
        for _ in 0..evaluations.len() {
            let pick = &evaluations[rng.gen_range(0..evaluations.len())];
            if best.map(|b| pick.score > b.score).unwrap_or(true) {
                best = Some(pick);
            }
        }
        let best = best.expect("nonempty evaluations");
        best_scores.push(best.score);
        // Key on the serialized param set; BTreeMap makes it canonical.
        let key = serde_json::to_string(&best.params).unwrap_or_default();
        *best_params_counts.entry(key).or_insert(0) += 1;
    }

    let mean = best_scores.iter().sum::<f64>() / best_scores.len() as f64;
    let var = best_scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>()
        / best_scores.len() as f64;
    let modal = best_params_counts.values().copied().max().unwrap_or(0);

    StabilityMetrics {
        best_score_std: var.sqrt(),
        modal_agreement: modal as f64 / STABILITY_RESAMPLES as f64,
        n_resamples: STABILITY_RESAMPLES,
    }
}

// ─── Overfitting ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverfitRisk {
    /// Degradation ≤ 10%.
    Low,
    /// Degradation ≤ 25%.
    Medium,
    /// Degradation > 25%.
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverfittingReport {
    pub in_sample_score: f64,
    pub out_of_sample_score: f64,
    /// `1 - oos/is` for positive in-sample scores.
    pub degradation: f64,
    pub risk: OverfitRisk,
}

/// Fraction of bars assigned to the in-sample window.
const IS_FRACTION: f64 = 0.7;
/// Minimum bars each side of the split needs to produce a meaningful score.
const MIN_SPLIT_BARS: usize = 60;

/// Re-run the best parameters on a chronological in-sample/out-of-sample
/// split. `None` when there is too little data for a meaningful split or
/// either segment fails to produce a score.
pub fn overfitting_check(
    bars: &[Bar],
    base_config: &BacktestConfig,
    best_params: &ParamSet,
    config: &OptimizationConfig,
) -> Option<OverfittingReport> {
    let split = (bars.len() as f64 * IS_FRACTION) as usize;
    if split < MIN_SPLIT_BARS || bars.len() - split < MIN_SPLIT_BARS {
        return None;
    }

    let candidate = apply_params(base_config, best_params).ok()?;
    let is_score = segment_score(&bars[..split], &candidate, config)?;
    let oos_score = segment_score(&bars[split..], &candidate, config)?;

    let degradation = if is_score.abs() > f64::EPSILON && is_score > 0.0 {
        1.0 - oos_score / is_score
    } else {
        // A non-positive in-sample score has nothing to degrade from.
        0.0
    };
    let risk = if degradation <= 0.10 {
        OverfitRisk::Low
    } else if degradation <= 0.25 {
        OverfitRisk::Medium
    } else {
        OverfitRisk::High
    };

    Some(OverfittingReport {
        in_sample_score: is_score,
        out_of_sample_score: oos_score,
        degradation,
        risk,
    })
}

fn segment_score(bars: &[Bar], config: &BacktestConfig, opt: &OptimizationConfig) -> Option<f64> {
    let result = run_backtest(bars, config).ok()?;
    let metrics = PerformanceMetrics::compute(&result.equity, &result.trades, opt.risk_free_rate);
    opt.objective.score(&metrics)
}
