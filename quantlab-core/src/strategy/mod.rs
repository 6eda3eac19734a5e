//! Strategy trait and concrete strategies.
//!
//! A strategy is a pure function of observed history: `on_bar` sees the bars
//! up to and including the current index and emits a target stance. It never
//! touches the account — position sizing, costs, and risk exits all belong to
//! the executor.

mod breakout;
mod ma_crossover;
mod momentum;

pub use breakout::ChannelBreakout;
pub use ma_crossover::MaCrossover;
pub use momentum::Momentum;

use crate::domain::{Bar, StrategyParams};

/// Desired stance after observing bar `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Be long (enter if flat).
    Long,
    /// Be flat (exit if long).
    Flat,
    /// Keep the current stance.
    Hold,
}

pub trait Strategy: Send {
    /// Evaluate the bar at `index`. `bars[..=index]` is the visible history;
    /// the executor guarantees `index < bars.len()`.
    fn on_bar(&mut self, bars: &[Bar], index: usize) -> Signal;

    /// Bars required before the first non-hold signal.
    fn warmup_bars(&self) -> usize;
}

/// Instantiate the strategy a config names.
pub fn build_strategy(params: &StrategyParams) -> Box<dyn Strategy> {
    match params {
        StrategyParams::MaCrossover {
            fast_period,
            slow_period,
        } => Box::new(MaCrossover::new(*fast_period, *slow_period)),
        StrategyParams::Momentum {
            lookback,
            threshold,
        } => Box::new(Momentum::new(*lookback, *threshold)),
        StrategyParams::ChannelBreakout { lookback } => {
            Box::new(ChannelBreakout::new(*lookback))
        }
    }
}

/// Simple moving average of closes over `bars[start..=end]`.
pub(crate) fn sma(bars: &[Bar], end: usize, period: usize) -> Option<f64> {
    if period == 0 || end + 1 < period {
        return None;
    }
    let start = end + 1 - period;
    let sum: f64 = bars[start..=end].iter().map(|b| b.close).sum();
    Some(sum / period as f64)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_needs_full_window() {
        let bars = testing::bars_from_closes(&[1.0, 2.0, 3.0]);
        assert_eq!(sma(&bars, 1, 3), None);
        assert_eq!(sma(&bars, 2, 3), Some(2.0));
    }

    #[test]
    fn factory_builds_each_variant() {
        let specs = [
            StrategyParams::MaCrossover {
                fast_period: 5,
                slow_period: 20,
            },
            StrategyParams::Momentum {
                lookback: 10,
                threshold: 0.02,
            },
            StrategyParams::ChannelBreakout { lookback: 20 },
        ];
        for params in &specs {
            let strat = build_strategy(params);
            assert_eq!(strat.warmup_bars(), params.warmup_bars());
        }
    }
}
