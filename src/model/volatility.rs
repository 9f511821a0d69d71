//! Volatility estimation
//!
//! Normalized daily volatility for binary market prices. Prediction market
//! daily moves live roughly in 0-0.3, so raw figures are divided by 0.3 and
//! capped at 1.0.

use crate::market::VolatilityMethod;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Raw daily move that maps to a normalized volatility of 1.0
const NORMALIZATION_SCALE: f64 = 0.3;

/// Rolling realized volatility estimator from log returns of price history
pub struct VolatilityEstimator {
    /// Window duration for volatility calculation
    window: Duration,
    /// Price history with timestamps
    prices: VecDeque<(DateTime<Utc>, Decimal)>,
}

impl VolatilityEstimator {
    /// Create a new volatility estimator with given window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            prices: VecDeque::new(),
        }
    }

    /// Add a new price observation
    pub fn update(&mut self, timestamp: DateTime<Utc>, price: Decimal) {
        self.prices.push_back((timestamp, price));

        let cutoff = timestamp - self.window;
        while let Some((ts, _)) = self.prices.front() {
            if *ts < cutoff {
                self.prices.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of observations currently inside the window
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Standard deviation of log returns inside the window
    pub fn raw_volatility(&self) -> Option<f64> {
        if self.prices.len() < 2 {
            return None;
        }

        let mut returns: Vec<f64> = Vec::new();
        for i in 1..self.prices.len() {
            let prev_price: f64 = self.prices[i - 1].1.try_into().unwrap_or(0.0);
            let curr_price: f64 = self.prices[i].1.try_into().unwrap_or(0.0);
            if prev_price > 0.0 && curr_price > 0.0 {
                returns.push((curr_price / prev_price).ln());
            }
        }

        if returns.is_empty() {
            return None;
        }

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        Some(variance.sqrt())
    }

    /// Normalized realized volatility in [0, 1]
    pub fn estimate(&self) -> Option<Decimal> {
        let raw = self.raw_volatility()?;
        Decimal::try_from(normalize(raw))
            .ok()
            .map(|v| v.round_dp(4))
    }
}

/// Estimate volatility from reported price changes
///
/// Prefers the 24h change, then the 7d change scaled down by sqrt(7), then
/// the 30d change scaled down by sqrt(30).
pub fn estimate_from_price_changes(
    one_day: Option<f64>,
    one_week: Option<f64>,
    one_month: Option<f64>,
) -> Option<(f64, VolatilityMethod)> {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

    let (scaled, method) = if let Some(change) = finite(one_day) {
        (change.abs(), VolatilityMethod::PriceChange24h)
    } else if let Some(change) = finite(one_week) {
        (
            change.abs() / 7f64.sqrt(),
            VolatilityMethod::PriceChange7dScaled,
        )
    } else if let Some(change) = finite(one_month) {
        (
            change.abs() / 30f64.sqrt(),
            VolatilityMethod::PriceChange30dScaled,
        )
    } else {
        return None;
    };

    let rounded = (normalize(scaled) * 10_000.0).round() / 10_000.0;
    Some((rounded, method))
}

/// Volume at which the proxy volume factor saturates
const PROXY_FULL_VOLUME: f64 = 10_000_000.0;

/// Proxy volatility for markets without any price movement data
///
/// Blends price uncertainty (distance of the first outcome price from 0 or
/// 1), a log-scaled volume factor and a time-to-close factor, weighted
/// 0.5 / 0.3 / 0.2. Markets with no close date get a neutral time factor.
pub fn estimate_proxy(
    first_price: f64,
    volume: f64,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let uncertainty = if first_price.is_finite() {
        first_price.min(1.0 - first_price).clamp(0.0, 0.5) * 2.0
    } else {
        0.0
    };

    let volume_factor = if volume.is_finite() && volume > 0.0 {
        ((volume + 1.0).log10() / PROXY_FULL_VOLUME.log10()).min(1.0)
    } else {
        0.0
    };

    let time_factor = match end_date {
        None => 0.5,
        Some(end) => {
            let days = (end - now).num_seconds() as f64 / 86_400.0;
            if days < 1.0 {
                0.9
            } else if days < 7.0 {
                0.7
            } else if days < 30.0 {
                0.5
            } else {
                0.3
            }
        }
    };

    let score = (uncertainty * 0.5 + volume_factor * 0.3 + time_factor * 0.2).clamp(0.0, 1.0);
    (score * 10_000.0).round() / 10_000.0
}

fn normalize(raw: f64) -> f64 {
    (raw / NORMALIZATION_SCALE).min(1.0)
}
