//! Domain types shared across the engine and the runner.

pub mod bar;
pub mod config;
pub mod equity;
pub mod ids;
pub mod trade;

pub use bar::Bar;
pub use config::{
    BacktestConfig, LeverageConfig, LiquidationOrder, RiskLimits, StrategyParams,
};
pub use equity::{EquityCurve, EquityPoint};
pub use ids::{ConfigHash, RunId};
pub use trade::{Fill, FillReason, Side, TradeRecord};
