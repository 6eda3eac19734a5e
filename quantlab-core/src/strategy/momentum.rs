//! Trailing-return momentum.

use crate::domain::Bar;

use super::{Signal, Strategy};

/// Long when the return over the trailing `lookback` bars exceeds
/// `threshold`, flat when it drops below `-threshold`, Hold in between.
pub struct Momentum {
    lookback: usize,
    threshold: f64,
}

impl Momentum {
    pub fn new(lookback: usize, threshold: f64) -> Self {
        Self {
            lookback,
            threshold,
        }
    }
}

impl Strategy for Momentum {
    fn on_bar(&mut self, bars: &[Bar], index: usize) -> Signal {
        if index < self.lookback {
            return Signal::Hold;
        }
        let past = bars[index - self.lookback].close;
        if past <= 0.0 {
            return Signal::Hold;
        }
        let ret = (bars[index].close - past) / past;
        if ret > self.threshold {
            Signal::Long
        } else if ret < -self.threshold {
            Signal::Flat
        } else {
            Signal::Hold
        }
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::bars_from_closes;

    #[test]
    fn long_when_trailing_return_exceeds_threshold() {
        let bars = bars_from_closes(&[100.0, 100.0, 100.0, 110.0]);
        let mut strat = Momentum::new(3, 0.05);
        assert_eq!(strat.on_bar(&bars, 3), Signal::Long);
    }

    #[test]
    fn flat_when_trailing_return_below_negative_threshold() {
        let bars = bars_from_closes(&[100.0, 100.0, 100.0, 90.0]);
        let mut strat = Momentum::new(3, 0.05);
        assert_eq!(strat.on_bar(&bars, 3), Signal::Flat);
    }

    #[test]
    fn hold_inside_band_and_during_warmup() {
        let bars = bars_from_closes(&[100.0, 100.0, 100.0, 101.0]);
        let mut strat = Momentum::new(3, 0.05);
        assert_eq!(strat.on_bar(&bars, 1), Signal::Hold);
        assert_eq!(strat.on_bar(&bars, 3), Signal::Hold);
    }
}
