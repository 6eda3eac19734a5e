//! Strategy and run configuration.
//!
//! `StrategyParams` is a tagged union: each strategy variant carries exactly
//! the parameters it needs, validated exhaustively at construction. There are
//! no optional per-strategy sub-objects to chain through — an invalid
//! combination cannot be represented past `validate()`.

use serde::{Deserialize, Serialize};

use crate::domain::ids::ConfigHash;
use crate::error::BacktestError;

/// Parameters for one strategy variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    /// Long when the fast SMA crosses above the slow SMA, flat on the
    /// opposite cross.
    MaCrossover { fast_period: usize, slow_period: usize },
    /// Long when trailing return over `lookback` bars exceeds `threshold`,
    /// flat when it drops below `-threshold`.
    Momentum { lookback: usize, threshold: f64 },
    /// Long on a close above the highest high of the previous `lookback`
    /// bars, flat on a close below the lowest low.
    ChannelBreakout { lookback: usize },
}

impl StrategyParams {
    /// Bars the strategy needs before it can emit a non-hold signal.
    pub fn warmup_bars(&self) -> usize {
        match self {
            Self::MaCrossover { slow_period, .. } => *slow_period,
            Self::Momentum { lookback, .. } => *lookback,
            Self::ChannelBreakout { lookback } => *lookback,
        }
    }

    fn validate(&self) -> Result<(), BacktestError> {
        match self {
            Self::MaCrossover {
                fast_period,
                slow_period,
            } => {
                if *fast_period == 0 {
                    return Err(BacktestError::config("fast_period must be >= 1"));
                }
                if fast_period >= slow_period {
                    return Err(BacktestError::config(format!(
                        "fast_period ({fast_period}) must be < slow_period ({slow_period})"
                    )));
                }
            }
            Self::Momentum {
                lookback,
                threshold,
            } => {
                if *lookback == 0 {
                    return Err(BacktestError::config("lookback must be >= 1"));
                }
                if !threshold.is_finite() || *threshold < 0.0 {
                    return Err(BacktestError::config(
                        "momentum threshold must be finite and >= 0",
                    ));
                }
            }
            Self::ChannelBreakout { lookback } => {
                if *lookback == 0 {
                    return Err(BacktestError::config("lookback must be >= 1"));
                }
            }
        }
        Ok(())
    }
}

/// Per-run risk limits, applied by the executor on every bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Exit when price falls this fraction below entry (e.g. 0.05 = 5%).
    /// None disables the stop.
    pub stop_loss: Option<f64>,
    /// Exit when price rises this fraction above entry. None disables.
    pub take_profit: Option<f64>,
    /// Halt all new entries once drawdown from the equity peak exceeds this
    /// fraction. Open positions are closed. None disables the halt.
    pub max_drawdown_halt: Option<f64>,
    /// Fraction of equity committed per position (0, 1].
    pub max_position_pct: f64,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            stop_loss: None,
            take_profit: None,
            max_drawdown_halt: None,
            max_position_pct: 0.95,
        }
    }
}

/// Which open exposure is liquidated first under a margin call.
///
/// With a single net position this only affects event ordering, but the
/// choice is explicit config rather than an implementation accident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationOrder {
    /// Close the largest notional exposure first.
    #[default]
    LargestNotionalFirst,
    /// Close in entry order, oldest first.
    OldestFirst,
}

/// Leverage and margin settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageConfig {
    /// Notional may reach `equity * max_leverage`. 1.0 = unlevered.
    pub max_leverage: f64,
    /// Force-close when equity < `maintenance_margin * open notional`.
    pub maintenance_margin: f64,
    pub liquidation_order: LiquidationOrder,
}

impl Default for LeverageConfig {
    fn default() -> Self {
        Self {
            max_leverage: 1.0,
            maintenance_margin: 0.05,
            liquidation_order: LiquidationOrder::default(),
        }
    }
}

/// Complete configuration for a single backtest run.
///
/// Immutable once handed to the executor. `validate()` is the single
/// gate — the engine refuses to start on an invalid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub symbol: String,
    pub params: StrategyParams,
    pub initial_capital: f64,
    /// Commission as a fraction of traded notional (e.g. 0.001 = 10 bps).
    pub commission: f64,
    /// Slippage as a fractional adverse price offset per fill.
    pub slippage: f64,
    pub risk: RiskLimits,
    pub leverage: LeverageConfig,
    /// Seed for any stochastic component (synthetic sources, Monte Carlo).
    pub seed: u64,
}

impl BacktestConfig {
    pub fn new(symbol: impl Into<String>, params: StrategyParams, initial_capital: f64) -> Self {
        Self {
            symbol: symbol.into(),
            params,
            initial_capital,
            commission: 0.001,
            slippage: 0.0001,
            risk: RiskLimits::default(),
            leverage: LeverageConfig::default(),
            seed: 42,
        }
    }

    /// Fail-fast validation. Called by the executor before replay starts;
    /// a failing config never produces a partial run.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(BacktestError::config(format!(
                "initial_capital must be > 0, got {}",
                self.initial_capital
            )));
        }
        if !(0.0..1.0).contains(&self.commission) {
            return Err(BacktestError::config(format!(
                "commission must be in [0, 1), got {}",
                self.commission
            )));
        }
        if !self.slippage.is_finite() || self.slippage < 0.0 {
            return Err(BacktestError::config(format!(
                "slippage must be >= 0, got {}",
                self.slippage
            )));
        }
        if !(0.0..=1.0).contains(&self.risk.max_position_pct) || self.risk.max_position_pct == 0.0 {
            return Err(BacktestError::config(format!(
                "max_position_pct must be in (0, 1], got {}",
                self.risk.max_position_pct
            )));
        }
        for (name, value) in [
            ("stop_loss", self.risk.stop_loss),
            ("take_profit", self.risk.take_profit),
            ("max_drawdown_halt", self.risk.max_drawdown_halt),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(BacktestError::config(format!(
                        "{name} must be > 0 when set, got {v}"
                    )));
                }
            }
        }
        if !self.leverage.max_leverage.is_finite() || self.leverage.max_leverage < 1.0 {
            return Err(BacktestError::config(format!(
                "max_leverage must be >= 1, got {}",
                self.leverage.max_leverage
            )));
        }
        if !(0.0..1.0).contains(&self.leverage.maintenance_margin) {
            return Err(BacktestError::config(format!(
                "maintenance_margin must be in [0, 1), got {}",
                self.leverage.maintenance_margin
            )));
        }
        self.params.validate()
    }

    /// Deterministic fingerprint of this configuration.
    ///
    /// Serde field order is fixed by struct declaration, so the JSON is
    /// canonical and the hash is stable across runs and threads.
    pub fn fingerprint(&self) -> ConfigHash {
        let json = serde_json::to_string(self).expect("BacktestConfig must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BacktestConfig {
        BacktestConfig::new(
            "BTCUSDT",
            StrategyParams::MaCrossover {
                fast_period: 10,
                slow_period: 30,
            },
            10_000.0,
        )
    }

    #[test]
    fn valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn zero_capital_rejected() {
        let mut cfg = sample_config();
        cfg.initial_capital = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(BacktestError::Config(_))
        ));
    }

    #[test]
    fn fast_ge_slow_rejected() {
        let mut cfg = sample_config();
        cfg.params = StrategyParams::MaCrossover {
            fast_period: 30,
            slow_period: 30,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_stop_loss_rejected() {
        let mut cfg = sample_config();
        cfg.risk.stop_loss = Some(-0.05);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn leverage_below_one_rejected() {
        let mut cfg = sample_config();
        cfg.leverage.max_leverage = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = sample_config().fingerprint();
        let b = sample_config().fingerprint();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_on_param_change() {
        let a = sample_config();
        let mut b = sample_config();
        b.params = StrategyParams::MaCrossover {
            fast_period: 11,
            slow_period: 30,
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn config_serialization_roundtrip() {
        let cfg = sample_config();
        let json = serde_json::to_string(&cfg).unwrap();
        let deser: BacktestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, deser);
    }
}
