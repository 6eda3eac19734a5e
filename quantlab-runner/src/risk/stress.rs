//! Stress scenarios — named shocks applied to a realized return series.
//!
//! Pure functions of (returns, scenario): shock the series, rebuild the
//! implied equity path, and report the return/drawdown deltas. No hidden
//! state and nothing stochastic.

use serde::{Deserialize, Serialize};

use crate::metrics::max_drawdown;

/// A named shock applied to the return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StressScenario {
    /// Add a constant shock to every periodic return.
    UniformShock { name: String, shock: f64 },
    /// Scale every return's deviation from the mean by `factor`.
    VolatilityScale { name: String, factor: f64 },
    /// Replace the single worst-placed day with a crash return of the
    /// given magnitude (inserted at the series midpoint).
    SingleDayCrash { name: String, crash_return: f64 },
}

impl StressScenario {
    pub fn name(&self) -> &str {
        match self {
            Self::UniformShock { name, .. }
            | Self::VolatilityScale { name, .. }
            | Self::SingleDayCrash { name, .. } => name,
        }
    }

    /// Shocked copy of the return series.
    pub fn apply(&self, returns: &[f64]) -> Vec<f64> {
        match self {
            Self::UniformShock { shock, .. } => returns.iter().map(|r| r + shock).collect(),
            Self::VolatilityScale { factor, .. } => {
                let mean = if returns.is_empty() {
                    0.0
                } else {
                    returns.iter().sum::<f64>() / returns.len() as f64
                };
                returns.iter().map(|r| mean + (r - mean) * factor).collect()
            }
            Self::SingleDayCrash { crash_return, .. } => {
                let mut shocked = returns.to_vec();
                if !shocked.is_empty() {
                    let mid = shocked.len() / 2;
                    shocked[mid] = *crash_return;
                }
                shocked
            }
        }
    }
}

/// Baseline vs. shocked outcome for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressOutcome {
    pub scenario: String,
    pub base_total_return: f64,
    pub stressed_total_return: f64,
    pub return_delta: f64,
    pub base_max_drawdown: f64,
    pub stressed_max_drawdown: f64,
    pub drawdown_delta: f64,
}

/// Run every scenario against the return series.
pub fn run_stress_tests(returns: &[f64], scenarios: &[StressScenario]) -> Vec<StressOutcome> {
    let base_equity = compound(returns);
    let base_total = total_from_equity(&base_equity);
    let base_mdd = max_drawdown(&base_equity);

    scenarios
        .iter()
        .map(|scenario| {
            let shocked = scenario.apply(returns);
            let equity = compound(&shocked);
            let total = total_from_equity(&equity);
            let mdd = max_drawdown(&equity);
            StressOutcome {
                scenario: scenario.name().to_string(),
                base_total_return: base_total,
                stressed_total_return: total,
                return_delta: total - base_total,
                base_max_drawdown: base_mdd,
                stressed_max_drawdown: mdd,
                drawdown_delta: mdd - base_mdd,
            }
        })
        .collect()
}

/// Standard scenario library.
pub fn standard_scenarios() -> Vec<StressScenario> {
    vec![
        StressScenario::UniformShock {
            name: "mild_bear".to_string(),
            shock: -0.001,
        },
        StressScenario::UniformShock {
            name: "severe_bear".to_string(),
            shock: -0.005,
        },
        StressScenario::VolatilityScale {
            name: "vol_double".to_string(),
            factor: 2.0,
        },
        StressScenario::SingleDayCrash {
            name: "flash_crash".to_string(),
            crash_return: -0.20,
        },
    ]
}

/// Equity path implied by compounding returns from 1.0.
fn compound(returns: &[f64]) -> Vec<f64> {
    let mut equity = Vec::with_capacity(returns.len() + 1);
    let mut value = 1.0;
    equity.push(value);
    for r in returns {
        value *= 1.0 + r;
        equity.push(value);
    }
    equity
}

fn total_from_equity(equity: &[f64]) -> f64 {
    if equity.len() < 2 || equity[0] <= 0.0 {
        return 0.0;
    }
    (equity[equity.len() - 1] - equity[0]) / equity[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_returns() -> Vec<f64> {
        (0..100).map(|i| ((i % 11) as f64 - 5.0) * 0.002).collect()
    }

    #[test]
    fn negative_uniform_shock_reduces_return() {
        let returns = sample_returns();
        let scenarios = vec![StressScenario::UniformShock {
            name: "bear".to_string(),
            shock: -0.002,
        }];
        let outcomes = run_stress_tests(&returns, &scenarios);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].return_delta < 0.0);
    }

    #[test]
    fn volatility_scaling_deepens_drawdowns() {
        let returns = sample_returns();
        let scenarios = vec![StressScenario::VolatilityScale {
            name: "vol2x".to_string(),
            factor: 2.0,
        }];
        let outcomes = run_stress_tests(&returns, &scenarios);
        assert!(outcomes[0].stressed_max_drawdown >= outcomes[0].base_max_drawdown);
    }

    #[test]
    fn flash_crash_shows_up_in_drawdown_delta() {
        let returns = vec![0.001; 50];
        let scenarios = vec![StressScenario::SingleDayCrash {
            name: "crash".to_string(),
            crash_return: -0.25,
        }];
        let outcomes = run_stress_tests(&returns, &scenarios);
        assert!(outcomes[0].drawdown_delta >= 0.20);
    }

    #[test]
    fn stress_is_deterministic() {
        let returns = sample_returns();
        let scenarios = standard_scenarios();
        let a = run_stress_tests(&returns, &scenarios);
        let b = run_stress_tests(&returns, &scenarios);
        assert_eq!(a, b);
    }

    #[test]
    fn standard_library_is_nonempty_with_unique_names() {
        let scenarios = standard_scenarios();
        let mut names: Vec<&str> = scenarios.iter().map(|s| s.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), scenarios.len());
    }
}
