//! Bayesian search — Gaussian-process surrogate with expected improvement.
//!
//! Dimensions are encoded onto the unit cube; ints, floats, bools, and
//! choices all round-trip through `ParameterRange::{to_unit, from_unit}`, so
//! the surrogate only ever sees `[0, 1]^d`. The acquisition is maximized by
//! scoring a random candidate pool rather than gradient ascent — cheap,
//! derivative-free, and good enough at these dimensionalities.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use quantlab_core::rng::SeedHierarchy;

use super::{ParamSet, ParameterRange, SearchMethod};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianConfig {
    /// Random evaluations before the surrogate takes over.
    pub n_initial_points: usize,
    /// Candidate pool size per acquisition maximization.
    pub n_candidates: usize,
    /// RBF kernel length scale in unit-cube coordinates.
    pub length_scale: f64,
    /// Observation noise added to the kernel diagonal.
    pub noise: f64,
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            n_initial_points: 10,
            n_candidates: 256,
            length_scale: 0.2,
            noise: 1e-6,
        }
    }
}

pub struct BayesianSearch {
    ranges: Vec<ParameterRange>,
    config: BayesianConfig,
    rng: StdRng,
    budget: usize,
    proposed: usize,
    /// (unit-cube coordinates, score) for every successful evaluation.
    observed: Vec<(Vec<f64>, f64)>,
}

impl BayesianSearch {
    pub fn new(
        ranges: &[ParameterRange],
        config: BayesianConfig,
        max_evaluations: usize,
        seed: u64,
    ) -> Self {
        Self {
            ranges: ranges.to_vec(),
            config,
            rng: SeedHierarchy::new(seed).rng_for("bayesian_search", 0),
            budget: max_evaluations,
            proposed: 0,
            observed: Vec::new(),
        }
    }

    fn random_unit_point(&mut self) -> Vec<f64> {
        (0..self.ranges.len()).map(|_| self.rng.gen::<f64>()).collect()
    }

    fn decode(&self, unit: &[f64]) -> ParamSet {
        self.ranges
            .iter()
            .zip(unit)
            .map(|(range, &u)| (range.name.clone(), range.from_unit(u)))
            .collect()
    }

    fn encode(&self, params: &ParamSet) -> Vec<f64> {
        self.ranges
            .iter()
            .map(|range| {
                params
                    .get(&range.name)
                    .map(|v| range.to_unit(v))
                    .unwrap_or(0.0)
            })
            .collect()
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let dist2: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
        (-dist2 / (2.0 * self.config.length_scale.powi(2))).exp()
    }

    /// Next point by expected improvement over a random candidate pool.
    /// Falls back to a random point if the GP fit degenerates.
    fn acquire(&mut self) -> Vec<f64> {
        let surrogate = match Surrogate::fit(self) {
            Some(s) => s,
            None => return self.random_unit_point(),
        };
        let best_y = self
            .observed
            .iter()
            .map(|(_, y)| *y)
            .fold(f64::NEG_INFINITY, f64::max);

        let mut best_point = self.random_unit_point();
        let mut best_ei = f64::NEG_INFINITY;
        for _ in 0..self.config.n_candidates {
            let candidate = self.random_unit_point();
            let ei = surrogate.expected_improvement(self, &candidate, best_y);
            if ei > best_ei {
                best_ei = ei;
                best_point = candidate;
            }
        }
        best_point
    }
}

/// Fitted GP posterior: Cholesky factor of the kernel matrix and the
/// precomputed weight vector.
struct Surrogate {
    points: Vec<Vec<f64>>,
    chol: Cholesky,
    alpha: Vec<f64>,
}

impl Surrogate {
    fn fit(search: &BayesianSearch) -> Option<Self> {
        let n = search.observed.len();
        if n == 0 {
            return None;
        }
        let points: Vec<Vec<f64>> = search.observed.iter().map(|(x, _)| x.clone()).collect();
        let y: Vec<f64> = search.observed.iter().map(|(_, y)| *y).collect();

        let mut k = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..n {
                k[i][j] = search.kernel(&points[i], &points[j]);
            }
            k[i][i] += search.config.noise;
        }
        let chol = Cholesky::decompose(&k)?;
        let alpha = chol.solve(&y);
        Some(Self {
            points,
            chol,
            alpha,
        })
    }

    fn posterior(&self, search: &BayesianSearch, x: &[f64]) -> (f64, f64) {
        let k_star: Vec<f64> = self
            .points
            .iter()
            .map(|p| search.kernel(p, x))
            .collect();
        let mean: f64 = k_star.iter().zip(&self.alpha).map(|(k, a)| k * a).sum();
        let v = self.chol.solve_lower(&k_star);
        let var = (search.kernel(x, x) - v.iter().map(|vi| vi * vi).sum::<f64>()).max(0.0);
        (mean, var)
    }

    fn expected_improvement(&self, search: &BayesianSearch, x: &[f64], best_y: f64) -> f64 {
        let (mean, var) = self.posterior(search, x);
        let std = var.sqrt();
        if std <= 1e-12 {
            return (mean - best_y).max(0.0);
        }
        let z = (mean - best_y) / std;
        let normal = Normal::new(0.0, 1.0).expect("unit normal");
        (mean - best_y) * normal.cdf(z) + std * normal.pdf(z)
    }
}

/// Lower-triangular Cholesky factor of a symmetric positive-definite matrix.
struct Cholesky {
    l: Vec<Vec<f64>>,
}

impl Cholesky {
    fn decompose(a: &[Vec<f64>]) -> Option<Self> {
        let n = a.len();
        let mut l = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..=i {
                let sum: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
                if i == j {
                    let d = a[i][i] - sum;
                    if d <= 0.0 {
                        return None;
                    }
                    l[i][j] = d.sqrt();
                } else {
                    l[i][j] = (a[i][j] - sum) / l[j][j];
                }
            }
        }
        Some(Self { l })
    }

    /// Solve `L y = b` (forward substitution).
    fn solve_lower(&self, b: &[f64]) -> Vec<f64> {
        let n = b.len();
        let mut y = vec![0.0; n];
        for i in 0..n {
            let sum: f64 = (0..i).map(|k| self.l[i][k] * y[k]).sum();
            y[i] = (b[i] - sum) / self.l[i][i];
        }
        y
    }

    /// Solve `L L^T x = b`.
    fn solve(&self, b: &[f64]) -> Vec<f64> {
        let y = self.solve_lower(b);
        let n = b.len();
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let sum: f64 = (i + 1..n).map(|k| self.l[k][i] * x[k]).sum();
            x[i] = (y[i] - sum) / self.l[i][i];
        }
        x
    }
}

impl SearchMethod for BayesianSearch {
    fn propose(&mut self, n: usize) -> Vec<ParamSet> {
        let take = n.min(self.budget.saturating_sub(self.proposed));
        let mut batch = Vec::with_capacity(take);
        for _ in 0..take {
            let point = if self.observed.len() < self.config.n_initial_points {
                self.random_unit_point()
            } else {
                self.acquire()
            };
            batch.push(self.decode(&point));
        }
        self.proposed += batch.len();
        batch
    }

    fn ingest(&mut self, params: &ParamSet, score: Option<f64>) {
        // Failed evaluations carry no information the surrogate can use.
        if let Some(s) = score {
            if s.is_finite() {
                let coords = self.encode(params);
                self.observed.push((coords, s));
            }
        }
    }

    fn finished(&self) -> bool {
        self.proposed >= self.budget
    }
}
