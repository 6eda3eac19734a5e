//! Execution cost model: slippage and commission.

use crate::domain::Side;

/// Fractional costs applied to every fill.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Commission as a fraction of traded notional.
    pub commission_rate: f64,
    /// Adverse price offset as a fraction of the raw price.
    pub slippage_rate: f64,
}

impl CostModel {
    pub fn new(commission_rate: f64, slippage_rate: f64) -> Self {
        Self {
            commission_rate,
            slippage_rate,
        }
    }

    /// Execution price after slippage. Buys fill above the raw price,
    /// sells below it.
    pub fn fill_price(&self, side: Side, raw_price: f64) -> f64 {
        match side {
            Side::Buy => raw_price * (1.0 + self.slippage_rate),
            Side::Sell => raw_price * (1.0 - self.slippage_rate),
        }
    }

    /// Commission charged on a fill of the given notional.
    pub fn commission(&self, notional: f64) -> f64 {
        notional * self.commission_rate
    }

    /// Cash cost of slippage for a fill of `quantity` at `raw_price`.
    pub fn slippage_cost(&self, raw_price: f64, quantity: f64) -> f64 {
        raw_price * self.slippage_rate * quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buys_fill_above_sells_below() {
        let model = CostModel::new(0.001, 0.0001);
        assert!(model.fill_price(Side::Buy, 100.0) > 100.0);
        assert!(model.fill_price(Side::Sell, 100.0) < 100.0);
    }

    #[test]
    fn zero_costs_are_identity() {
        let model = CostModel::new(0.0, 0.0);
        assert_eq!(model.fill_price(Side::Buy, 100.0), 100.0);
        assert_eq!(model.commission(10_000.0), 0.0);
    }

    #[test]
    fn commission_scales_with_notional() {
        let model = CostModel::new(0.001, 0.0);
        assert!((model.commission(10_000.0) - 10.0).abs() < 1e-9);
    }
}
