//! Account state during replay: cash, open position, equity peak.

use chrono::{DateTime, Utc};

/// One open long position.
#[derive(Debug, Clone)]
pub struct Position {
    pub quantity: f64,
    /// Execution price of the entry fill (slippage included).
    pub entry_price: f64,
    pub entry_commission: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_index: usize,
}

impl Position {
    pub fn notional(&self, price: f64) -> f64 {
        self.quantity * price
    }
}

/// Mutable account state owned by a single run. With leverage above 1.0,
/// cash goes negative on entry (borrowed notional) and equity is the
/// mark-to-market sum.
#[derive(Debug)]
pub struct Account {
    pub cash: f64,
    pub position: Option<Position>,
    /// Running equity peak, for drawdown-halt tracking.
    pub peak_equity: f64,
}

impl Account {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            position: None,
            peak_equity: initial_capital,
        }
    }

    /// Mark-to-market equity at the given price.
    pub fn equity(&self, price: f64) -> f64 {
        match &self.position {
            Some(pos) => self.cash + pos.notional(price),
            None => self.cash,
        }
    }

    /// Open notional at the given price; 0.0 when flat.
    pub fn open_notional(&self, price: f64) -> f64 {
        self.position
            .as_ref()
            .map(|p| p.notional(price))
            .unwrap_or(0.0)
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn observe_peak(&mut self, equity: f64) {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }

    /// Drawdown from the running peak, as a positive fraction.
    pub fn drawdown(&self, equity: f64) -> f64 {
        if self.peak_equity > 0.0 {
            ((self.peak_equity - equity) / self.peak_equity).max(0.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn flat_equity_is_cash() {
        let acct = Account::new(10_000.0);
        assert_eq!(acct.equity(123.0), 10_000.0);
        assert!(acct.is_flat());
    }

    #[test]
    fn equity_marks_position_to_market() {
        let mut acct = Account::new(10_000.0);
        acct.cash = 0.0;
        acct.position = Some(Position {
            quantity: 100.0,
            entry_price: 100.0,
            entry_commission: 10.0,
            entry_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            entry_index: 0,
        });
        assert_eq!(acct.equity(110.0), 11_000.0);
        assert_eq!(acct.open_notional(110.0), 11_000.0);
    }

    #[test]
    fn drawdown_tracks_peak() {
        let mut acct = Account::new(10_000.0);
        acct.observe_peak(12_000.0);
        assert!((acct.drawdown(9_000.0) - 0.25).abs() < 1e-12);
        assert_eq!(acct.drawdown(13_000.0), 0.0);
    }
}
