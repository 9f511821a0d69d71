//! Pressure scoring
//!
//! Pressure is the absolute divergence of two markets' volatility estimates.
//! An unknown volatility on either side yields an unknown pressure rather
//! than zero pressure.

use crate::config::PressureConfig;
use crate::market::{Market, VolatilityMethod};

/// Absolute volatility difference, `None` when either side is unknown
pub fn pressure(market1: &Market, market2: &Market) -> Option<f64> {
    let v1: f64 = market1.volatility?.try_into().ok()?;
    let v2: f64 = market2.volatility?.try_into().ok()?;
    if v1 < 0.0 || v2 < 0.0 {
        return None;
    }
    Some((v1 - v2).abs())
}

/// Pressure scorer with a comparability policy for volatility methods
#[derive(Debug, Clone, Default)]
pub struct PressureScorer {
    /// Treat volatilities computed by different methods as incomparable
    pub require_matching_methods: bool,
}

impl PressureScorer {
    pub fn new(require_matching_methods: bool) -> Self {
        Self {
            require_matching_methods,
        }
    }

    pub fn from_config(config: &PressureConfig) -> Self {
        Self::new(config.require_matching_methods)
    }

    /// Score a market pair
    pub fn score(&self, market1: &Market, market2: &Market) -> Option<f64> {
        if self.require_matching_methods
            && !methods_comparable(market1.volatility_method, market2.volatility_method)
        {
            tracing::debug!(
                market1 = %market1.id,
                market2 = %market2.id,
                method1 = ?market1.volatility_method,
                method2 = ?market2.volatility_method,
                "Volatility methods differ, pressure unknown"
            );
            return None;
        }
        pressure(market1, market2)
    }
}

fn methods_comparable(a: VolatilityMethod, b: VolatilityMethod) -> bool {
    a == b && a != VolatilityMethod::Unknown
}
