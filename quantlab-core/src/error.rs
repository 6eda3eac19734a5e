//! Error taxonomy for the backtest engine.
//!
//! Three non-overlapping families:
//! - `Config`: contradictory or invalid inputs. Raised before any bar is
//!   replayed — a run that starts has a valid config.
//! - `Data`: missing or malformed historical data (empty range, out-of-order
//!   or duplicate timestamps, non-finite prices).
//! - `Execution`: a numeric failure mid-simulation. A margin call is NOT an
//!   execution error; it terminates the run normally with a
//!   `TerminationReason::MarginCall`.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BacktestError {
    #[error("config error: {0}")]
    Config(String),
    #[error("data error: {0}")]
    Data(String),
    #[error("execution error at bar {bar_index}: {message}")]
    Execution { bar_index: usize, message: String },
}

impl BacktestError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn execution(bar_index: usize, msg: impl Into<String>) -> Self {
        Self::Execution {
            bar_index,
            message: msg.into(),
        }
    }
}
