//! Moving-average crossover.

use crate::domain::Bar;

use super::{sma, Signal, Strategy};

/// Long when the fast SMA is above the slow SMA after a cross, flat on the
/// opposite cross. Between crosses the signal is Hold.
pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
    prev_diff: Option<f64>,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            prev_diff: None,
        }
    }
}

impl Strategy for MaCrossover {
    fn on_bar(&mut self, bars: &[Bar], index: usize) -> Signal {
        let (Some(fast), Some(slow)) = (
            sma(bars, index, self.fast_period),
            sma(bars, index, self.slow_period),
        ) else {
            return Signal::Hold;
        };

        let diff = fast - slow;
        let signal = match self.prev_diff {
            Some(prev) if prev <= 0.0 && diff > 0.0 => Signal::Long,
            Some(prev) if prev >= 0.0 && diff < 0.0 => Signal::Flat,
            // First evaluable bar: take the side the averages already show.
            None if diff > 0.0 => Signal::Long,
            None if diff < 0.0 => Signal::Flat,
            _ => Signal::Hold,
        };
        self.prev_diff = Some(diff);
        signal
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::bars_from_closes;

    #[test]
    fn emits_long_on_upward_cross() {
        // Falling then sharply rising closes force fast SMA through slow SMA.
        let closes = [
            10.0, 9.8, 9.6, 9.4, 9.2, 9.0, 8.8, 8.6, 8.4, 8.2, 9.0, 10.0, 11.0, 12.0, 13.0,
        ];
        let bars = bars_from_closes(&closes);
        let mut strat = MaCrossover::new(2, 5);
        let signals: Vec<Signal> = (0..bars.len()).map(|i| strat.on_bar(&bars, i)).collect();
        assert!(signals.contains(&Signal::Long));
    }

    #[test]
    fn holds_during_warmup() {
        let bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        let mut strat = MaCrossover::new(2, 5);
        for i in 0..bars.len() {
            assert_eq!(strat.on_bar(&bars, i), Signal::Hold);
        }
    }

    #[test]
    fn emits_flat_on_downward_cross() {
        let closes = [
            8.0, 8.5, 9.0, 9.5, 10.0, 10.5, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0, 5.0,
        ];
        let bars = bars_from_closes(&closes);
        let mut strat = MaCrossover::new(2, 5);
        let signals: Vec<Signal> = (0..bars.len()).map(|i| strat.on_bar(&bars, i)).collect();
        assert!(signals.contains(&Signal::Flat));
    }
}
