//! Risk simulator integration tests plus property checks for the
//! distributional invariants.

use proptest::prelude::*;

use quantlab_runner::metrics::{avg_drawdown, max_drawdown};
use quantlab_runner::risk::monte_carlo::{percentile_sorted, run_forward_sim};
use quantlab_runner::risk::var::{cvar_at, historical_var, parametric_var};
use quantlab_runner::risk::{ForwardSimConfig, PathMode};

#[test]
fn eight_return_historical_var_example() {
    let returns = [0.01, -0.02, 0.015, -0.005, 0.02, -0.01, 0.005, 0.0];
    let var = historical_var(&returns, 0.95).unwrap();
    assert!((var - (-0.02)).abs() < 1e-12);
}

proptest! {
    #[test]
    fn cvar_never_exceeds_historical_var(
        returns in prop::collection::vec(-0.2f64..0.2, 4..200),
        confidence in 0.80f64..0.995,
    ) {
        let var = historical_var(&returns, confidence).unwrap();
        let cvar = cvar_at(&returns, var);
        prop_assert!(cvar <= var + 1e-12);
    }

    #[test]
    fn cvar_never_exceeds_parametric_var(
        returns in prop::collection::vec(-0.2f64..0.2, 8..200),
        confidence in 0.80f64..0.995,
    ) {
        if let Some(var) = parametric_var(&returns, confidence) {
            let cvar = cvar_at(&returns, var);
            prop_assert!(cvar <= var + 1e-12);
        }
    }

    #[test]
    fn drawdown_ordering_holds(
        values in prop::collection::vec(1.0f64..100_000.0, 2..300),
    ) {
        let max = max_drawdown(&values);
        let avg = avg_drawdown(&values);
        prop_assert!(max >= avg - 1e-12);
        prop_assert!(avg >= 0.0);
        prop_assert!(max <= 1.0);
    }

    #[test]
    fn forward_sim_percentiles_are_ordered(
        seed in 0u64..1_000,
        horizon in 10usize..60,
    ) {
        let returns: Vec<f64> = (0..120)
            .map(|i| ((i * 7 + seed as usize) % 17) as f64 * 0.002 - 0.016)
            .collect();
        let config = ForwardSimConfig {
            horizon,
            n_paths: 200,
            mode: PathMode::Parametric,
            seed,
        };
        let summary = run_forward_sim(&returns, &config).unwrap();
        let p = summary.percentiles;
        let seq = [p.p5, p.p10, p.p25, p.p50, p.p75, p.p90, p.p95];
        prop_assert!(seq.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(summary.worst_tail_mean <= p.p5 + 1e-9);
    }

    #[test]
    fn percentile_sorted_is_monotone_in_q(
        mut values in prop::collection::vec(-1.0f64..1.0, 2..100),
        q1 in 0.0f64..1.0,
        q2 in 0.0f64..1.0,
    ) {
        values.sort_by(|a, b| a.total_cmp(b));
        let (lo, hi) = if q1 <= q2 { (q1, q2) } else { (q2, q1) };
        prop_assert!(percentile_sorted(&values, lo) <= percentile_sorted(&values, hi) + 1e-12);
    }
}
