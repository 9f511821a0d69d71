//! poly-corr: Correlation-to-expected-value engine for related Polymarket markets
//!
//! This library provides the core components for:
//! - Implied and joint outcome probabilities of correlated binary markets
//! - Payoffs of every position combination across joint outcomes
//! - Expected value, stake and best/worst case aggregation
//! - Volatility pressure scoring
//! - Investment score, risk label and strategy ranking
//! - Bounded-concurrency batch evaluation of candidate pairs
//! - Logging and metrics

pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod market;
pub mod model;
pub mod payoff;
pub mod pressure;
pub mod ranking;
pub mod telemetry;
pub mod valuation;

pub use engine::{CorrelationEngine, PairAnalysis};
pub use error::EngineError;
