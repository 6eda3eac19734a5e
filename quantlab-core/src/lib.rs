//! QuantLab Core — engine, domain types, bar replay, margin accounting.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (bars, fills, trades, equity curves, strategy configs)
//! - Deterministic bar-by-bar executor with cost model and margin accounting
//! - Strategy trait + concrete strategies (MA crossover, momentum, breakout)
//! - Bar sources (static, seeded synthetic) behind one trait
//! - Config fingerprinting and deterministic RNG seeding

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod rng;
pub mod strategy;

pub use error::BacktestError;
