//! Channel (Donchian) breakout.

use crate::domain::Bar;

use super::{Signal, Strategy};

/// Long on a close above the highest high of the previous `lookback` bars,
/// flat on a close below the lowest low of the same window.
pub struct ChannelBreakout {
    lookback: usize,
}

impl ChannelBreakout {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }
}

impl Strategy for ChannelBreakout {
    fn on_bar(&mut self, bars: &[Bar], index: usize) -> Signal {
        if index < self.lookback {
            return Signal::Hold;
        }
        // Window excludes the current bar; a bar cannot break out over itself.
        let window = &bars[index - self.lookback..index];
        let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        let close = bars[index].close;
        if close > highest {
            Signal::Long
        } else if close < lowest {
            Signal::Flat
        } else {
            Signal::Hold
        }
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }
}
