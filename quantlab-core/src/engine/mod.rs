//! Deterministic bar-by-bar strategy executor.
//!
//! The run loop is single-threaded and strictly sequential: at each bar the
//! strategy sees only `bars[..=i]` plus its own state, risk exits and margin
//! checks are applied, and an equity point is appended. No hidden state, no
//! clocks, no side effects — identical (bars, config) input produces
//! bit-identical output.
//!
//! Anything the caller might want to forward elsewhere (risk exits, margin
//! calls) comes back as `RunEvent`s on the result. The engine itself never
//! notifies anyone.

mod account;
mod cost;

pub use account::{Account, Position};
pub use cost::CostModel;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::validate_bars;
use crate::domain::{
    BacktestConfig, Bar, ConfigHash, EquityCurve, EquityPoint, Fill, FillReason, Side,
    TradeRecord,
};
use crate::error::BacktestError;
use crate::strategy::{build_strategy, Signal};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// All bars replayed.
    Completed,
    /// Equity fell below maintenance margin; positions were force-closed and
    /// the replay stopped. A terminal outcome, not an error.
    MarginCall,
}

/// Notable occurrence during a run, returned for the caller to forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    pub timestamp: DateTime<Utc>,
    pub bar_index: usize,
    pub kind: RunEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEventKind {
    PositionOpened,
    PositionClosed(FillReason),
    DrawdownHalt,
    MarginCall,
}

/// Everything one executor run produces. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub config_hash: ConfigHash,
    pub fills: Vec<Fill>,
    pub trades: Vec<TradeRecord>,
    pub equity: EquityCurve,
    pub events: Vec<RunEvent>,
    pub termination: TerminationReason,
    /// Bars actually replayed (shorter than the input on a margin call).
    pub bar_count: usize,
}

impl RunResult {
    pub fn final_equity(&self) -> f64 {
        self.equity.last().equity
    }

    pub fn total_return(&self) -> f64 {
        let first = self.equity.first().equity;
        if first > 0.0 {
            (self.final_equity() - first) / first
        } else {
            0.0
        }
    }
}

struct Replay<'a> {
    config: &'a BacktestConfig,
    cost: CostModel,
    account: Account,
    fills: Vec<Fill>,
    trades: Vec<TradeRecord>,
    events: Vec<RunEvent>,
    halted: bool,
}

impl<'a> Replay<'a> {
    fn new(config: &'a BacktestConfig) -> Self {
        Self {
            config,
            cost: CostModel::new(config.commission, config.slippage),
            account: Account::new(config.initial_capital),
            fills: Vec::new(),
            trades: Vec::new(),
            events: Vec::new(),
            halted: false,
        }
    }

    fn open_position(&mut self, bar: &Bar, index: usize) {
        let raw = bar.close;
        let price = self.cost.fill_price(Side::Buy, raw);
        let equity = self.account.equity(raw);
        let budget = equity
            * self.config.risk.max_position_pct
            * self.config.leverage.max_leverage;
        let quantity = budget / price;
        if quantity <= 0.0 {
            return;
        }
        let notional = quantity * price;
        let commission = self.cost.commission(notional);
        self.account.cash -= notional + commission;
        self.account.position = Some(Position {
            quantity,
            entry_price: price,
            entry_commission: commission,
            entry_time: bar.timestamp,
            entry_index: index,
        });

        let resulting = self.account.equity(raw);
        self.fills.push(Fill {
            timestamp: bar.timestamp,
            side: Side::Buy,
            reason: FillReason::Signal,
            quantity,
            price,
            commission,
            slippage: self.cost.slippage_cost(raw, quantity),
            resulting_capital: resulting,
            pnl: 0.0,
        });
        self.events.push(RunEvent {
            timestamp: bar.timestamp,
            bar_index: index,
            kind: RunEventKind::PositionOpened,
        });
    }

    /// Close the open position at `raw_price`. No-op when flat.
    fn close_position(&mut self, bar: &Bar, index: usize, raw_price: f64, reason: FillReason) {
        let Some(pos) = self.account.position.take() else {
            return;
        };
        let price = self.cost.fill_price(Side::Sell, raw_price);
        let notional = pos.quantity * price;
        let commission = self.cost.commission(notional);
        self.account.cash += notional - commission;

        let entry_cost = pos.quantity * pos.entry_price + pos.entry_commission;
        let net_pnl = notional - commission - entry_cost;
        let resulting = self.account.cash;

        self.fills.push(Fill {
            timestamp: bar.timestamp,
            side: Side::Sell,
            reason,
            quantity: pos.quantity,
            price,
            commission,
            slippage: self.cost.slippage_cost(raw_price, pos.quantity),
            resulting_capital: resulting,
            pnl: net_pnl,
        });
        self.trades.push(TradeRecord {
            entry_time: pos.entry_time,
            exit_time: bar.timestamp,
            entry_price: pos.entry_price,
            exit_price: price,
            quantity: pos.quantity,
            exit_reason: reason,
            net_pnl,
            return_pct: if entry_cost > 0.0 { net_pnl / entry_cost } else { 0.0 },
            bars_held: index - pos.entry_index,
        });
        self.events.push(RunEvent {
            timestamp: bar.timestamp,
            bar_index: index,
            kind: RunEventKind::PositionClosed(reason),
        });
    }

    /// Intrabar stop-loss / take-profit. Stop-loss is checked first: when
    /// both thresholds sit inside one bar's range the conservative (loss)
    /// exit wins.
    fn apply_risk_exits(&mut self, bar: &Bar, index: usize) {
        let Some(pos) = self.account.position.as_ref() else {
            return;
        };
        let entry = pos.entry_price;

        if let Some(sl) = self.config.risk.stop_loss {
            let trigger = entry * (1.0 - sl);
            if bar.low <= trigger {
                self.close_position(bar, index, trigger, FillReason::StopLoss);
                return;
            }
        }
        if let Some(tp) = self.config.risk.take_profit {
            let trigger = entry * (1.0 + tp);
            if bar.high >= trigger {
                self.close_position(bar, index, trigger, FillReason::TakeProfit);
            }
        }
    }

    /// Maintenance-margin check at the bar close. Returns true when a margin
    /// call fired and the run must stop.
    fn check_margin(&mut self, bar: &Bar, index: usize) -> bool {
        let notional = self.account.open_notional(bar.close);
        if notional <= 0.0 {
            return false;
        }
        let equity = self.account.equity(bar.close);
        if equity < self.config.leverage.maintenance_margin * notional {
            // Liquidation order is configured; with one net position every
            // order liquidates the same single exposure.
            self.close_position(bar, index, bar.close, FillReason::MarginCall);
            self.events.push(RunEvent {
                timestamp: bar.timestamp,
                bar_index: index,
                kind: RunEventKind::MarginCall,
            });
            return true;
        }
        false
    }

    fn check_drawdown_halt(&mut self, bar: &Bar, index: usize) {
        let Some(limit) = self.config.risk.max_drawdown_halt else {
            return;
        };
        if self.halted {
            return;
        }
        let equity = self.account.equity(bar.close);
        if self.account.drawdown(equity) > limit {
            self.close_position(bar, index, bar.close, FillReason::DrawdownHalt);
            self.halted = true;
            self.events.push(RunEvent {
                timestamp: bar.timestamp,
                bar_index: index,
                kind: RunEventKind::DrawdownHalt,
            });
        }
    }
}

/// Replay `bars` under `config`.
///
/// Fails fast on an invalid config or malformed bar sequence; once the loop
/// starts it always produces a complete `RunResult` (a margin call terminates
/// the replay but is an outcome, not an error).
pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> Result<RunResult, BacktestError> {
    config.validate()?;
    validate_bars(bars)?;

    let mut strategy = build_strategy(&config.params);
    let mut replay = Replay::new(config);
    let mut equity_curve = EquityCurve::new(EquityPoint {
        timestamp: bars[0].timestamp,
        equity: config.initial_capital,
    });
    let mut termination = TerminationReason::Completed;
    let mut bar_count = 0usize;

    for (i, bar) in bars.iter().enumerate() {
        bar_count = i + 1;

        replay.apply_risk_exits(bar, i);

        if replay.check_margin(bar, i) {
            termination = TerminationReason::MarginCall;
            if i > 0 {
                equity_curve.push(EquityPoint {
                    timestamp: bar.timestamp,
                    equity: replay.account.equity(bar.close),
                });
            }
            break;
        }

        replay.check_drawdown_halt(bar, i);

        let signal = strategy.on_bar(bars, i);
        if !replay.halted {
            match signal {
                Signal::Long if replay.account.is_flat() => replay.open_position(bar, i),
                Signal::Flat if !replay.account.is_flat() => {
                    replay.close_position(bar, i, bar.close, FillReason::Signal)
                }
                _ => {}
            }
        }

        let equity = replay.account.equity(bar.close);
        replay.account.observe_peak(equity);
        if i > 0 {
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity,
            });
        }

        if equity <= 0.0 {
            return Err(BacktestError::execution(i, "equity depleted to zero"));
        }
    }

    // Open exposure at the end of history is closed at the final bar so the
    // trade list and equity curve agree.
    if termination == TerminationReason::Completed && !replay.account.is_flat() {
        let last_index = bars.len() - 1;
        let last = &bars[last_index];
        replay.close_position(last, last_index, last.close, FillReason::EndOfData);
        let equity = replay.account.equity(last.close);
        if let Some(point) = equity_curve.points().last().copied() {
            debug_assert_eq!(point.timestamp, last.timestamp);
        }
        // Replace the final mark-to-market point with the realized one.
        let mut points = equity_curve.points().to_vec();
        if let Some(p) = points.last_mut() {
            p.equity = equity;
        }
        equity_curve = EquityCurve::from_points(points);
    }

    Ok(RunResult {
        config_hash: config.fingerprint(),
        fills: replay.fills,
        trades: replay.trades,
        equity: equity_curve,
        events: replay.events,
        termination,
        bar_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrategyParams;
    use crate::strategy::testing::bars_from_closes;

    fn momentum_config() -> BacktestConfig {
        let mut cfg = BacktestConfig::new(
            "TEST",
            StrategyParams::Momentum {
                lookback: 2,
                threshold: 0.01,
            },
            10_000.0,
        );
        cfg.commission = 0.0;
        cfg.slippage = 0.0;
        cfg
    }

    #[test]
    fn trending_series_produces_a_profitable_trade() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 2.0).collect();
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, &momentum_config()).unwrap();
        assert_eq!(result.termination, TerminationReason::Completed);
        assert!(!result.trades.is_empty());
        assert!(result.final_equity() > 10_000.0);
        // End-of-data close pairs every entry with an exit.
        assert_eq!(result.fills.len() % 2, 0);
    }

    #[test]
    fn equity_curve_covers_every_bar() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + (i % 7) as f64).collect();
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, &momentum_config()).unwrap();
        assert_eq!(result.equity.len(), bars.len());
        assert_eq!(result.bar_count, bars.len());
    }

    #[test]
    fn stop_loss_exits_at_threshold() {
        let mut cfg = momentum_config();
        cfg.risk.stop_loss = Some(0.05);
        // Rise to trigger entry, then crash through the stop.
        let closes = [
            100.0, 100.0, 105.0, 110.0, 112.0, 114.0, 90.0, 85.0, 84.0, 83.0,
        ];
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, &cfg).unwrap();
        assert!(result
            .trades
            .iter()
            .any(|t| t.exit_reason == FillReason::StopLoss));
    }

    #[test]
    fn commission_reduces_final_equity() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 2.0).collect();
        let bars = bars_from_closes(&closes);

        let free = run_backtest(&bars, &momentum_config()).unwrap();
        let mut cfg = momentum_config();
        cfg.commission = 0.002;
        let costly = run_backtest(&bars, &cfg).unwrap();
        assert!(costly.final_equity() < free.final_equity());
    }

    #[test]
    fn leveraged_crash_triggers_margin_call() {
        let mut cfg = momentum_config();
        cfg.leverage.max_leverage = 5.0;
        cfg.leverage.maintenance_margin = 0.10;
        // Entry on the rise, then a collapse deep enough to breach margin.
        let closes = [
            100.0, 100.0, 103.0, 106.0, 109.0, 90.0, 75.0, 60.0, 45.0, 40.0,
        ];
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, &cfg).unwrap();
        assert_eq!(result.termination, TerminationReason::MarginCall);
        assert!(result
            .events
            .iter()
            .any(|e| e.kind == RunEventKind::MarginCall));
        assert!(result.bar_count < bars.len());
    }

    #[test]
    fn drawdown_halt_stops_new_entries() {
        let mut cfg = momentum_config();
        cfg.risk.max_drawdown_halt = Some(0.10);
        // Rally, 20% collapse past the halt, then a fresh rally the halted
        // account must ignore.
        let mut closes = vec![100.0, 100.0, 104.0, 108.0, 112.0, 116.0];
        closes.extend([100.0, 90.0, 85.0]);
        closes.extend((0..10).map(|i| 86.0 + i as f64 * 3.0));
        let bars = bars_from_closes(&closes);
        let result = run_backtest(&bars, &cfg).unwrap();
        assert!(result
            .events
            .iter()
            .any(|e| e.kind == RunEventKind::DrawdownHalt));
        let halt_index = result
            .events
            .iter()
            .find(|e| e.kind == RunEventKind::DrawdownHalt)
            .unwrap()
            .bar_index;
        assert!(result
            .events
            .iter()
            .all(|e| e.kind != RunEventKind::PositionOpened || e.bar_index <= halt_index));
    }

    #[test]
    fn identical_inputs_produce_identical_results() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 10.0 + i as f64 * 0.3)
            .collect();
        let bars = bars_from_closes(&closes);
        let cfg = momentum_config();
        let a = run_backtest(&bars, &cfg).unwrap();
        let b = run_backtest(&bars, &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn invalid_capital_fails_before_replay() {
        let bars = bars_from_closes(&[100.0, 101.0]);
        let mut cfg = momentum_config();
        cfg.initial_capital = -5.0;
        assert!(matches!(
            run_backtest(&bars, &cfg),
            Err(BacktestError::Config(_))
        ));
    }

    #[test]
    fn empty_bars_is_data_error() {
        let cfg = momentum_config();
        assert!(matches!(
            run_backtest(&[], &cfg),
            Err(BacktestError::Data(_))
        ));
    }
}
