//! Parameter optimizer — drives many executor runs across a parameter space.
//!
//! Search methods (grid, random, genetic, Bayesian) share one capability
//! trait: propose a batch of candidates, ingest scores, say when they are
//! done. The coordinator owns everything else — parallel evaluation on a
//! bounded rayon pool, single-writer aggregation, progress snapshots,
//! cooperative cancellation, soft timeout, and post-optimization analysis.
//!
//! Workers never touch optimizer state: a batch is proposed, evaluated in
//! parallel, joined, and folded by the coordinator alone.

pub mod analysis;
mod bayesian;
mod genetic;
mod grid;
mod random;

pub use analysis::{OverfitRisk, OverfittingReport, StabilityMetrics};
pub use bayesian::{BayesianConfig, BayesianSearch};
pub use genetic::{GeneticConfig, GeneticSearch};
pub use grid::GridSearch;
pub use random::RandomSearch;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use quantlab_core::domain::{BacktestConfig, Bar, StrategyParams};
use quantlab_core::engine::run_backtest;
use quantlab_core::error::BacktestError;

use crate::metrics::PerformanceMetrics;
use crate::objective::Objective;
use crate::progress::{OptimizationProgress, OptimizationStatus};

// ─── Parameter space ─────────────────────────────────────────────────

/// One sampled parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Choice(String),
}

impl ParamValue {
    /// Numeric encoding for correlation/surrogate purposes.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
            Self::Bool(v) => *v as u8 as f64,
            Self::Choice(_) => 0.0,
        }
    }
}

/// A full candidate assignment, keyed by parameter name. BTreeMap keeps
/// iteration (and serialization) order deterministic.
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Value space for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", rename_all = "snake_case")]
pub enum RangeSpec {
    Int { min: i64, max: i64, step: i64 },
    Float { min: f64, max: f64, step: f64 },
    Bool,
    Choice { values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub name: String,
    pub spec: RangeSpec,
}

impl ParameterRange {
    pub fn int(name: impl Into<String>, min: i64, max: i64, step: i64) -> Self {
        Self {
            name: name.into(),
            spec: RangeSpec::Int { min, max, step },
        }
    }

    pub fn float(name: impl Into<String>, min: f64, max: f64, step: f64) -> Self {
        Self {
            name: name.into(),
            spec: RangeSpec::Float { min, max, step },
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: RangeSpec::Bool,
        }
    }

    pub fn choice(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            spec: RangeSpec::Choice { values },
        }
    }

    fn validate(&self) -> Result<(), OptimizeError> {
        let bad = |msg: String| Err(OptimizeError::InvalidRange(msg));
        match &self.spec {
            RangeSpec::Int { min, max, step } => {
                if step <= &0 || min > max {
                    return bad(format!("{}: invalid int range", self.name));
                }
            }
            RangeSpec::Float { min, max, step } => {
                if !step.is_finite() || *step <= 0.0 || !min.is_finite() || !max.is_finite() || min > max
                {
                    return bad(format!("{}: invalid float range", self.name));
                }
            }
            RangeSpec::Bool => {}
            RangeSpec::Choice { values } => {
                if values.is_empty() {
                    return bad(format!("{}: empty choice list", self.name));
                }
            }
        }
        Ok(())
    }

    /// Discretized grid values for this dimension, in deterministic order.
    pub fn grid_values(&self) -> Vec<ParamValue> {
        match &self.spec {
            RangeSpec::Int { min, max, step } => (*min..=*max)
                .step_by(*step as usize)
                .map(ParamValue::Int)
                .collect(),
            RangeSpec::Float { min, max, step } => {
                let mut out = Vec::new();
                let mut i = 0u64;
                loop {
                    let v = min + *step * i as f64;
                    if v > max + step * 1e-9 {
                        break;
                    }
                    out.push(ParamValue::Float(v));
                    i += 1;
                }
                out
            }
            RangeSpec::Bool => vec![ParamValue::Bool(false), ParamValue::Bool(true)],
            RangeSpec::Choice { values } => {
                values.iter().cloned().map(ParamValue::Choice).collect()
            }
        }
    }

    /// Number of grid points along this dimension. The Float arm uses the
    /// same tolerance as `grid_values`, so the count always matches the
    /// enumerated grid.
    pub fn cardinality(&self) -> usize {
        match &self.spec {
            RangeSpec::Int { min, max, step } => ((max - min) / step + 1) as usize,
            RangeSpec::Float { min, max, step } => {
                ((max - min) / step + 1e-9).floor() as usize + 1
            }
            RangeSpec::Bool => 2,
            RangeSpec::Choice { values } => values.len(),
        }
    }

    /// Uniform draw respecting dtype and step.
    pub fn sample(&self, rng: &mut StdRng) -> ParamValue {
        match &self.spec {
            RangeSpec::Int { min, max, step } => {
                let steps = (max - min) / step;
                ParamValue::Int(min + step * rng.gen_range(0..=steps))
            }
            RangeSpec::Float { min, max, step } => {
                let steps = ((max - min) / step + 1e-9).floor() as u64;
                let v = min + step * rng.gen_range(0..=steps) as f64;
                ParamValue::Float(v.min(*max))
            }
            RangeSpec::Bool => ParamValue::Bool(rng.gen_bool(0.5)),
            RangeSpec::Choice { values } => {
                ParamValue::Choice(values[rng.gen_range(0..values.len())].clone())
            }
        }
    }

    /// Encode a value onto [0, 1] for surrogate models and importance.
    pub fn to_unit(&self, value: &ParamValue) -> f64 {
        match (&self.spec, value) {
            (RangeSpec::Int { min, max, .. }, ParamValue::Int(v)) => {
                if max == min {
                    0.0
                } else {
                    (*v - *min) as f64 / (*max - *min) as f64
                }
            }
            (RangeSpec::Float { min, max, .. }, ParamValue::Float(v)) => {
                if max <= min {
                    0.0
                } else {
                    (v - min) / (max - min)
                }
            }
            (RangeSpec::Bool, ParamValue::Bool(v)) => *v as u8 as f64,
            (RangeSpec::Choice { values }, ParamValue::Choice(c)) => {
                let idx = values.iter().position(|v| v == c).unwrap_or(0);
                if values.len() <= 1 {
                    0.0
                } else {
                    idx as f64 / (values.len() - 1) as f64
                }
            }
            _ => 0.0,
        }
    }

    /// Decode a [0, 1] coordinate back to a legal value (rounded to step,
    /// nearest choice index).
    pub fn from_unit(&self, u: f64) -> ParamValue {
        let u = u.clamp(0.0, 1.0);
        match &self.spec {
            RangeSpec::Int { min, max, step } => {
                let raw = *min as f64 + u * (*max - *min) as f64;
                let snapped = min + ((raw - *min as f64) / *step as f64).round() as i64 * step;
                ParamValue::Int(snapped.clamp(*min, *max))
            }
            RangeSpec::Float { min, max, step } => {
                let raw = min + u * (max - min);
                let snapped = min + ((raw - min) / step).round() * step;
                ParamValue::Float(snapped.clamp(*min, *max))
            }
            RangeSpec::Bool => ParamValue::Bool(u >= 0.5),
            RangeSpec::Choice { values } => {
                let idx = (u * (values.len() - 1) as f64).round() as usize;
                ParamValue::Choice(values[idx.min(values.len() - 1)].clone())
            }
        }
    }
}

/// Total grid cardinality across dimensions. Saturating: a huge space only
/// needs to compare against thresholds.
pub fn total_combinations(ranges: &[ParameterRange]) -> usize {
    ranges
        .iter()
        .map(ParameterRange::cardinality)
        .fold(1usize, |acc, c| acc.saturating_mul(c))
}

// ─── Method selection ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMethod {
    Grid,
    Random,
    Genetic,
    Bayesian,
    /// Pick by grid size: < 1,000 combinations → grid, < 10,000 → genetic,
    /// otherwise Bayesian.
    #[default]
    Auto,
}

/// Resolve `Auto` to a concrete method. Pure function of the ranges.
pub fn auto_select(ranges: &[ParameterRange]) -> OptimizationMethod {
    let combos = total_combinations(ranges);
    if combos < 1_000 {
        OptimizationMethod::Grid
    } else if combos < 10_000 {
        OptimizationMethod::Genetic
    } else {
        OptimizationMethod::Bayesian
    }
}

// ─── Search method capability ────────────────────────────────────────

/// Common capability of all search methods. The coordinator calls
/// `propose`, evaluates the batch, then `ingest`s results in proposal
/// order before proposing again.
pub trait SearchMethod {
    /// Up to `n` new candidates; fewer (or none) when the method is
    /// winding down.
    fn propose(&mut self, n: usize) -> Vec<ParamSet>;

    /// Feed back one evaluated candidate. `None` marks a failed evaluation.
    fn ingest(&mut self, params: &ParamSet, score: Option<f64>);

    /// True once the method has nothing more to propose.
    fn finished(&self) -> bool;
}

// ─── Configuration & result types ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub method: OptimizationMethod,
    pub objective: Objective,
    pub max_evaluations: usize,
    pub parallel_workers: usize,
    /// Soft budget in seconds; expiry returns best-so-far, not an error.
    pub timeout_secs: Option<f64>,
    pub risk_free_rate: f64,
    pub seed: u64,
    pub genetic: GeneticConfig,
    pub bayesian: BayesianConfig,
    /// Skip importance/stability/overfitting analysis when false.
    pub analyze: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            method: OptimizationMethod::Auto,
            objective: Objective::default(),
            max_evaluations: 200,
            parallel_workers: 4,
            timeout_secs: None,
            risk_free_rate: 0.0,
            seed: 42,
            genetic: GeneticConfig::default(),
            bayesian: BayesianConfig::default(),
            analyze: true,
        }
    }
}

/// One evaluated candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub params: ParamSet,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Concrete method that ran (never `Auto`).
    pub method: OptimizationMethod,
    pub best_params: ParamSet,
    pub best_score: Option<f64>,
    /// All successful evaluations, in completion order.
    pub evaluations: Vec<Evaluation>,
    /// Best score after each successful evaluation; non-decreasing.
    pub convergence: Vec<f64>,
    pub importance: BTreeMap<String, f64>,
    pub stability: Option<StabilityMetrics>,
    pub overfitting: Option<OverfittingReport>,
    pub status: OptimizationStatus,
    /// True when the search ran to its own termination (not cancelled or
    /// timed out).
    pub converged: bool,
    pub successful_evaluations: usize,
    pub failed_evaluations: usize,
    pub elapsed_secs: f64,
}

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid parameter range: {0}")]
    InvalidRange(String),
    #[error("invalid base configuration: {0}")]
    Config(#[from] BacktestError),
    #[error("no evaluation succeeded after {attempted} attempts")]
    Exhausted { attempted: usize },
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// ─── Candidate application ───────────────────────────────────────────

/// Apply a candidate's values onto a copy of the base config. Parameter
/// names bind to strategy fields explicitly; an unknown name is a config
/// error (a silently ignored dimension would corrupt every search).
pub fn apply_params(base: &BacktestConfig, params: &ParamSet) -> Result<BacktestConfig, BacktestError> {
    let mut config = base.clone();
    for (name, value) in params {
        apply_one(&mut config, name, value)?;
    }
    config.validate()?;
    Ok(config)
}

fn apply_one(config: &mut BacktestConfig, name: &str, value: &ParamValue) -> Result<(), BacktestError> {
    let as_usize = |v: &ParamValue| -> Result<usize, BacktestError> {
        match v {
            ParamValue::Int(i) if *i >= 0 => Ok(*i as usize),
            _ => Err(BacktestError::config(format!(
                "parameter {name} expects a non-negative integer"
            ))),
        }
    };
    let as_f64 = |v: &ParamValue| -> Result<f64, BacktestError> {
        match v {
            ParamValue::Float(f) => Ok(*f),
            ParamValue::Int(i) => Ok(*i as f64),
            _ => Err(BacktestError::config(format!(
                "parameter {name} expects a number"
            ))),
        }
    };

    match (name, &mut config.params) {
        ("fast_period", StrategyParams::MaCrossover { fast_period, .. }) => {
            *fast_period = as_usize(value)?;
        }
        ("slow_period", StrategyParams::MaCrossover { slow_period, .. }) => {
            *slow_period = as_usize(value)?;
        }
        ("lookback", StrategyParams::Momentum { lookback, .. })
        | ("lookback", StrategyParams::ChannelBreakout { lookback }) => {
            *lookback = as_usize(value)?;
        }
        ("threshold", StrategyParams::Momentum { threshold, .. }) => {
            *threshold = as_f64(value)?;
        }
        ("stop_loss", _) => config.risk.stop_loss = Some(as_f64(value)?),
        ("take_profit", _) => config.risk.take_profit = Some(as_f64(value)?),
        ("max_position_pct", _) => config.risk.max_position_pct = as_f64(value)?,
        ("max_leverage", _) => config.leverage.max_leverage = as_f64(value)?,
        _ => {
            return Err(BacktestError::config(format!(
                "parameter {name} does not apply to strategy {:?}",
                std::mem::discriminant(&config.params)
            )));
        }
    }
    Ok(())
}

// ─── Coordinator ─────────────────────────────────────────────────────

fn build_method(
    method: OptimizationMethod,
    ranges: &[ParameterRange],
    config: &OptimizationConfig,
) -> (OptimizationMethod, Box<dyn SearchMethod>) {
    let concrete = match method {
        OptimizationMethod::Auto => auto_select(ranges),
        other => other,
    };
    let boxed: Box<dyn SearchMethod> = match concrete {
        OptimizationMethod::Grid => {
            Box::new(GridSearch::new(ranges, config.max_evaluations))
        }
        OptimizationMethod::Random => {
            Box::new(RandomSearch::new(ranges, config.max_evaluations, config.seed))
        }
        OptimizationMethod::Genetic => Box::new(GeneticSearch::new(
            ranges,
            config.genetic.clone(),
            config.max_evaluations,
            config.seed,
        )),
        OptimizationMethod::Bayesian => Box::new(BayesianSearch::new(
            ranges,
            config.bayesian.clone(),
            config.max_evaluations,
            config.seed,
        )),
        OptimizationMethod::Auto => unreachable!("auto resolved above"),
    };
    (concrete, boxed)
}

/// Run an optimization over `ranges`.
///
/// Cancellation is cooperative: `cancel` is polled between batches and
/// in-flight evaluations always finish. `progress_cb` receives a snapshot
/// after every batch join; the optimizer itself never pushes notifications
/// anywhere else.
pub fn optimize(
    bars: &[Bar],
    base_config: &BacktestConfig,
    ranges: &[ParameterRange],
    config: &OptimizationConfig,
    progress_cb: Option<&(dyn Fn(&OptimizationProgress) + Sync)>,
    cancel: Option<&AtomicBool>,
) -> Result<OptimizationResult, OptimizeError> {
    base_config.validate()?;
    for range in ranges {
        range.validate()?;
    }

    let started = Instant::now();
    let (concrete_method, mut search) = build_method(config.method, ranges, config);

    // Empty space: zero evaluations is a valid, successful outcome.
    if ranges.is_empty() {
        return Ok(OptimizationResult {
            method: concrete_method,
            best_params: ParamSet::new(),
            best_score: None,
            evaluations: Vec::new(),
            convergence: Vec::new(),
            importance: BTreeMap::new(),
            stability: None,
            overfitting: None,
            status: OptimizationStatus::Completed,
            converged: true,
            successful_evaluations: 0,
            failed_evaluations: 0,
            elapsed_secs: started.elapsed().as_secs_f64(),
        });
    }

    let workers = config.parallel_workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;

    let total_target = config
        .max_evaluations
        .min(total_combinations(ranges).max(1));
    let mut progress = OptimizationProgress::new(total_target);

    let mut evaluations: Vec<Evaluation> = Vec::new();
    let mut convergence: Vec<f64> = Vec::new();
    let mut best: Option<Evaluation> = None;
    let mut attempted = 0usize;
    let mut failed = 0usize;
    let mut status = OptimizationStatus::Completed;

    loop {
        if attempted >= config.max_evaluations || search.finished() {
            break;
        }
        if cancel.map(|c| c.load(Ordering::Relaxed)).unwrap_or(false) {
            status = OptimizationStatus::Cancelled;
            break;
        }
        if let Some(budget) = config.timeout_secs {
            if started.elapsed().as_secs_f64() >= budget {
                status = OptimizationStatus::TimedOut;
                break;
            }
        }

        let remaining = config.max_evaluations - attempted;
        let batch = search.propose(workers.min(remaining));
        if batch.is_empty() {
            break;
        }
        attempted += batch.len();

        // Parallel evaluation; collect preserves proposal order so ingest
        // sees results in the order the method handed them out.
        let scored: Vec<(ParamSet, Option<f64>)> = pool.install(|| {
            batch
                .into_par_iter()
                .map(|params| {
                    let score = evaluate_candidate(bars, base_config, &params, config);
                    (params, score)
                })
                .collect()
        });

        // Single-writer aggregation.
        for (params, score) in scored {
            search.ingest(&params, score);
            match score {
                Some(s) => {
                    let is_new_best = best.as_ref().map(|b| s > b.score).unwrap_or(true);
                    if is_new_best {
                        debug!(score = s, ?params, "new incumbent");
                        best = Some(Evaluation {
                            params: params.clone(),
                            score: s,
                        });
                    }
                    evaluations.push(Evaluation { params, score: s });
                    convergence.push(best.as_ref().map(|b| b.score).unwrap_or(s));
                }
                None => {
                    warn!(?params, "candidate evaluation failed; excluding");
                    failed += 1;
                }
            }
        }

        progress.advance(
            evaluations.len() + failed - progress.current_iteration,
            best.as_ref().map(|b| b.score),
            started.elapsed().as_secs_f64(),
        );
        if let Some(cb) = progress_cb {
            cb(&progress);
        }
    }

    if attempted > 0 && evaluations.is_empty() {
        return Err(OptimizeError::Exhausted { attempted });
    }

    let converged = status == OptimizationStatus::Completed;
    let (importance, stability, overfitting) = if config.analyze && !evaluations.is_empty() {
        let best_eval = best.as_ref().expect("evaluations nonempty implies a best");
        (
            analysis::parameter_importance(ranges, &evaluations),
            Some(analysis::stability(&evaluations, config.seed)),
            analysis::overfitting_check(bars, base_config, &best_eval.params, config),
        )
    } else {
        (BTreeMap::new(), None, None)
    };

    progress.status = status;
    if let Some(cb) = progress_cb {
        cb(&progress);
    }

    Ok(OptimizationResult {
        method: concrete_method,
        best_params: best.as_ref().map(|b| b.params.clone()).unwrap_or_default(),
        best_score: best.map(|b| b.score),
        evaluations,
        convergence,
        importance,
        stability,
        overfitting,
        status,
        converged,
        successful_evaluations: 0, // set below
        failed_evaluations: failed,
        elapsed_secs: started.elapsed().as_secs_f64(),
    }
    .with_success_count())
}

impl OptimizationResult {
    fn with_success_count(mut self) -> Self {
        self.successful_evaluations = self.evaluations.len();
        self
    }

    pub fn total_evaluations(&self) -> usize {
        self.successful_evaluations + self.failed_evaluations
    }
}

/// One full executor + metrics run for a candidate. `None` on any failure —
/// invalid combination, execution error, or an undefined objective.
fn evaluate_candidate(
    bars: &[Bar],
    base_config: &BacktestConfig,
    params: &ParamSet,
    config: &OptimizationConfig,
) -> Option<f64> {
    let candidate = apply_params(base_config, params).ok()?;
    let result = run_backtest(bars, &candidate).ok()?;
    let metrics = PerformanceMetrics::compute(&result.equity, &result.trades, config.risk_free_rate);
    config.objective.score(&metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_cardinality_counts_combinations() {
        let ranges = vec![
            ParameterRange::int("fast_period", 5, 15, 1),
            ParameterRange::int("slow_period", 20, 30, 1),
        ];
        assert_eq!(total_combinations(&ranges), 121);
    }

    #[test]
    fn auto_selection_thresholds() {
        let small = vec![ParameterRange::int("a", 1, 10, 1)];
        assert_eq!(auto_select(&small), OptimizationMethod::Grid);

        let medium = vec![
            ParameterRange::int("a", 1, 50, 1),
            ParameterRange::int("b", 1, 50, 1),
        ];
        assert_eq!(auto_select(&medium), OptimizationMethod::Genetic);

        let large = vec![
            ParameterRange::int("a", 1, 100, 1),
            ParameterRange::int("b", 1, 100, 1),
            ParameterRange::int("c", 1, 100, 1),
        ];
        assert_eq!(auto_select(&large), OptimizationMethod::Bayesian);
    }

    #[test]
    fn float_grid_values_include_both_ends() {
        let range = ParameterRange::float("threshold", 0.01, 0.05, 0.01);
        let values = range.grid_values();
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], ParamValue::Float(0.01));
    }

    #[test]
    fn float_cardinality_matches_enumerated_grid() {
        // Ranges whose (max - min) / step lands just below an integer under
        // floating-point division.
        let awkward = [
            ParameterRange::float("a", 0.01, 0.05, 0.01),
            ParameterRange::float("b", 0.1, 0.3, 0.1),
            ParameterRange::float("c", 0.0, 1.0, 0.1),
            ParameterRange::float("d", 0.02, 0.02, 0.01),
        ];
        for range in &awkward {
            assert_eq!(
                range.cardinality(),
                range.grid_values().len(),
                "{} disagrees with its grid",
                range.name
            );
        }
    }

    #[test]
    fn float_samples_snap_to_step() {
        use quantlab_core::rng::SeedHierarchy;

        let range = ParameterRange::float("threshold", 0.01, 0.10, 0.01);
        let mut rng = SeedHierarchy::new(9).rng_for("sample", 0);
        for _ in 0..200 {
            let ParamValue::Float(v) = range.sample(&mut rng) else {
                panic!("wrong dtype")
            };
            assert!((0.01..=0.10).contains(&v));
            let steps = (v - 0.01) / 0.01;
            assert!((steps - steps.round()).abs() < 1e-6, "off-grid draw {v}");
        }
    }

    #[test]
    fn unit_roundtrip_snaps_to_grid() {
        let range = ParameterRange::int("lookback", 10, 50, 5);
        for u in [0.0, 0.3, 0.61, 1.0] {
            let v = range.from_unit(u);
            let ParamValue::Int(i) = v else { panic!() };
            assert!((10..=50).contains(&i));
            assert_eq!((i - 10) % 5, 0);
        }
    }

    #[test]
    fn apply_params_rejects_unknown_names() {
        let base = BacktestConfig::new(
            "X",
            StrategyParams::Momentum {
                lookback: 10,
                threshold: 0.02,
            },
            10_000.0,
        );
        let mut params = ParamSet::new();
        params.insert("fast_period".to_string(), ParamValue::Int(5));
        assert!(apply_params(&base, &params).is_err());
    }

    #[test]
    fn apply_params_sets_strategy_fields() {
        let base = BacktestConfig::new(
            "X",
            StrategyParams::MaCrossover {
                fast_period: 10,
                slow_period: 30,
            },
            10_000.0,
        );
        let mut params = ParamSet::new();
        params.insert("fast_period".to_string(), ParamValue::Int(7));
        params.insert("slow_period".to_string(), ParamValue::Int(21));
        let cfg = apply_params(&base, &params).unwrap();
        assert_eq!(
            cfg.params,
            StrategyParams::MaCrossover {
                fast_period: 7,
                slow_period: 21
            }
        );
    }

    #[test]
    fn invalid_combination_is_an_error_not_a_panic() {
        let base = BacktestConfig::new(
            "X",
            StrategyParams::MaCrossover {
                fast_period: 10,
                slow_period: 30,
            },
            10_000.0,
        );
        let mut params = ParamSet::new();
        params.insert("fast_period".to_string(), ParamValue::Int(40));
        assert!(apply_params(&base, &params).is_err());
    }
}
