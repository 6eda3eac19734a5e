//! Bar sources.
//!
//! The engine consumes bars through one trait with two concrete
//! implementations, selected at construction:
//! - `StaticSource`: caller-provided history (whatever the external data
//!   layer loaded).
//! - `SyntheticSource`: seeded geometric-Brownian fabrication for tests and
//!   simulated runs.
//!
//! Both gap-check the sequence — ascending, unique timestamps, sane OHLC —
//! before handing anything to the engine. An empty range is a `DataError`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::SeedableRng;

use crate::domain::Bar;
use crate::error::BacktestError;

/// Source of historical bars for a (symbol, range) request.
pub trait BarSource: Send + Sync {
    /// Ordered, validated bars in `[start, end]` inclusive.
    fn bars(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, BacktestError>;
}

/// Validate an already-loaded bar sequence: non-empty, strictly ascending
/// unique timestamps, sane OHLC on every bar.
pub fn validate_bars(bars: &[Bar]) -> Result<(), BacktestError> {
    if bars.is_empty() {
        return Err(BacktestError::data("empty bar sequence"));
    }
    for (i, w) in bars.windows(2).enumerate() {
        if w[1].timestamp <= w[0].timestamp {
            return Err(BacktestError::data(format!(
                "bars out of order at index {}: {} then {}",
                i + 1,
                w[0].timestamp,
                w[1].timestamp
            )));
        }
    }
    for (i, bar) in bars.iter().enumerate() {
        if !bar.is_sane() {
            return Err(BacktestError::data(format!(
                "malformed bar at index {i} ({})",
                bar.timestamp
            )));
        }
    }
    Ok(())
}

/// Pre-loaded history. The "real data" path: an external ingestion layer
/// fills it, the engine only ever sees the trait.
pub struct StaticSource {
    bars: Vec<Bar>,
}

impl StaticSource {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }
}

impl BarSource for StaticSource {
    fn bars(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, BacktestError> {
        if end <= start {
            return Err(BacktestError::config(format!(
                "end ({end}) must be after start ({start})"
            )));
        }
        let slice: Vec<Bar> = self
            .bars
            .iter()
            .filter(|b| b.timestamp >= start && b.timestamp <= end)
            .cloned()
            .collect();
        if slice.is_empty() {
            return Err(BacktestError::data(format!(
                "no bars in requested range {start}..{end}"
            )));
        }
        validate_bars(&slice)?;
        Ok(slice)
    }
}

/// Seeded synthetic bars: daily geometric Brownian motion.
///
/// Identical (seed, drift, volatility, range) always fabricates identical
/// bars, which keeps executor determinism testable end to end.
pub struct SyntheticSource {
    pub seed: u64,
    pub start_price: f64,
    /// Per-bar drift (e.g. 0.0005).
    pub drift: f64,
    /// Per-bar volatility (e.g. 0.02).
    pub volatility: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 100.0,
            drift: 0.0003,
            volatility: 0.02,
        }
    }
}

impl BarSource for SyntheticSource {
    fn bars(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, BacktestError> {
        if end <= start {
            return Err(BacktestError::config(format!(
                "end ({end}) must be after start ({start})"
            )));
        }
        let days = (end - start).num_days();
        if days <= 0 {
            return Err(BacktestError::data("range shorter than one bar"));
        }

        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        let mut price = self.start_price;
        let mut bars = Vec::with_capacity(days as usize);

        for i in 0..days {
            // Box-Muller from two uniforms; StdRng keeps this reproducible.
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

            let ret = self.drift + self.volatility * z;
            let open = price;
            let close = (price * (1.0 + ret)).max(0.01);
            let spread = open.max(close) * rng.gen_range(0.0..0.01);
            let high = open.max(close) + spread;
            let low = (open.min(close) - spread).max(0.005);
            let volume = rng.gen_range(1_000.0..100_000.0);

            bars.push(Bar {
                timestamp: start + Duration::days(i),
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }

        validate_bars(&bars)?;
        Ok(bars)
    }
}
