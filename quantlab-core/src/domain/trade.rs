//! Fills and round-trip trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

/// Why a fill happened. Carried on every fill so result consumers can tell
/// signal-driven exits from risk-driven ones without re-deriving anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillReason {
    Signal,
    StopLoss,
    TakeProfit,
    DrawdownHalt,
    MarginCall,
    EndOfData,
}

/// A single executed fill.
///
/// Owned exclusively by the `RunResult` that produced it; the engine never
/// shares or mutates fills after the run completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub reason: FillReason,
    pub quantity: f64,
    /// Execution price after slippage.
    pub price: f64,
    pub commission: f64,
    pub slippage: f64,
    /// Account equity immediately after this fill.
    pub resulting_capital: f64,
    /// Realized PnL net of costs; 0.0 on entries.
    pub pnl: f64,
}

/// One round trip: an entry fill paired with its exit fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub exit_reason: FillReason,
    /// PnL net of commission and slippage on both legs.
    pub net_pnl: f64,
    pub return_pct: f64,
    pub bars_held: usize,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn winner_classification() {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let trade = TradeRecord {
            entry_time: t,
            exit_time: t,
            entry_price: 100.0,
            exit_price: 105.0,
            quantity: 1.0,
            exit_reason: FillReason::Signal,
            net_pnl: 5.0,
            return_pct: 0.05,
            bars_held: 3,
        };
        assert!(trade.is_winner());
    }

    #[test]
    fn fill_serialization_roundtrip() {
        let fill = Fill {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            side: Side::Buy,
            reason: FillReason::Signal,
            quantity: 2.5,
            price: 101.25,
            commission: 0.25,
            slippage: 0.01,
            resulting_capital: 9_999.0,
            pnl: 0.0,
        };
        let json = serde_json::to_string(&fill).unwrap();
        let deser: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill, deser);
    }
}
