//! Market snapshot input
//!
//! Raw market records as handed over by the storage collaborator. Prices may
//! arrive as a JSON array or, as the Gamma API returns them, as a JSON-encoded
//! string such as `"[\"0.815\", \"0.185\"]"`.

use super::{Market, VolatilityMethod, NO_LABEL, YES_LABEL};
use crate::error::{EngineError, Result};
use crate::model::{estimate_from_price_changes, estimate_proxy, VolatilityEstimator};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Raw market record from storage
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub id: String,
    #[serde(default)]
    pub question: String,
    /// Outcome labels, defaults to Yes/No
    #[serde(default)]
    pub outcomes: Option<Vec<String>>,
    pub outcome_prices: OutcomePrices,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub volatility: Option<Decimal>,
    #[serde(default)]
    pub volatility_method: Option<VolatilityMethod>,
    /// Signed 24h price change, used when no volatility is stored
    #[serde(default)]
    pub one_day_price_change: Option<f64>,
    #[serde(default)]
    pub one_week_price_change: Option<f64>,
    #[serde(default)]
    pub one_month_price_change: Option<f64>,
    /// CLOB price history, preferred over price changes
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
    /// Scheduled close, only used by the proxy volatility
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// One CLOB price history sample
#[derive(Debug, Clone, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in seconds
    pub t: i64,
    pub p: Decimal,
}

/// Window of price history used for realized volatility
const HISTORY_WINDOW_HOURS: i64 = 24;

impl MarketSnapshot {
    /// Stored volatility, else realized volatility from history, else the
    /// price-change fallback chain
    fn resolve_volatility(&self) -> (Option<Decimal>, VolatilityMethod) {
        if let Some(vol) = self.volatility {
            return (Some(vol), self.volatility_method.unwrap_or_default());
        }

        let mut estimator = VolatilityEstimator::new(Duration::hours(HISTORY_WINDOW_HOURS));
        let mut points: Vec<&PricePoint> = self.price_history.iter().collect();
        points.sort_by_key(|point| point.t);
        for point in points {
            if let Some(ts) = DateTime::from_timestamp(point.t, 0) {
                estimator.update(ts, point.p);
            }
        }
        if let Some(vol) = estimator.estimate() {
            return (Some(vol), VolatilityMethod::PriceHistory);
        }

        match estimate_from_price_changes(
            self.one_day_price_change,
            self.one_week_price_change,
            self.one_month_price_change,
        ) {
            Some((vol, method)) => match Decimal::try_from(vol) {
                Ok(vol) => (Some(vol.round_dp(4)), method),
                Err(_) => (None, VolatilityMethod::Unknown),
            },
            None => (None, VolatilityMethod::Unknown),
        }
    }

    /// Convert into a [`Market`], optionally filling a missing volatility
    /// with the price/volume/time proxy
    ///
    /// Without the proxy a market with no volatility data keeps `None`, so
    /// its pressure stays unknown.
    pub fn into_market(self, proxy_volatility: bool) -> Result<Market> {
        let end_date = self.end_date;
        let mut market = Market::try_from(self)?;
        if market.volatility.is_none() && proxy_volatility {
            let first_price = market
                .outcome_prices
                .first()
                .and_then(|p| f64::try_from(*p).ok())
                .unwrap_or(0.0);
            let volume = f64::try_from(market.volume).unwrap_or(0.0);
            let proxy = estimate_proxy(first_price, volume, end_date, Utc::now());
            if let Ok(vol) = Decimal::try_from(proxy) {
                market.volatility = Some(vol.round_dp(4));
                market.volatility_method = VolatilityMethod::Proxy;
            }
        }
        Ok(market)
    }
}

/// Outcome prices in either of the shapes storage produces
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OutcomePrices {
    List(Vec<Decimal>),
    Encoded(String),
}

impl OutcomePrices {
    fn parse(&self) -> std::result::Result<Vec<Decimal>, String> {
        match self {
            OutcomePrices::List(prices) => Ok(prices.clone()),
            OutcomePrices::Encoded(raw) => {
                let items: Vec<String> = serde_json::from_str(raw)
                    .map_err(|e| format!("failed to parse outcome prices {raw}: {e}"))?;
                items
                    .iter()
                    .map(|s| {
                        Decimal::from_str(s.trim())
                            .map_err(|e| format!("bad outcome price {s:?}: {e}"))
                    })
                    .collect()
            }
        }
    }
}

impl TryFrom<MarketSnapshot> for Market {
    type Error = EngineError;

    fn try_from(snapshot: MarketSnapshot) -> Result<Self> {
        let outcome_prices = snapshot
            .outcome_prices
            .parse()
            .map_err(|reason| EngineError::invalid_market(&snapshot.id, reason))?;

        if let Some(price) = outcome_prices
            .iter()
            .find(|p| **p < Decimal::ZERO || **p > Decimal::ONE)
        {
            return Err(EngineError::invalid_market(
                &snapshot.id,
                format!("outcome price {price} outside [0, 1]"),
            ));
        }

        if let Some(vol) = snapshot.volatility {
            if vol < Decimal::ZERO {
                return Err(EngineError::invalid_market(
                    &snapshot.id,
                    format!("negative volatility {vol}"),
                ));
            }
        }

        let (volatility, volatility_method) = snapshot.resolve_volatility();
        let outcomes = snapshot
            .outcomes
            .unwrap_or_else(|| vec![YES_LABEL.to_string(), NO_LABEL.to_string()]);

        let now = Utc::now();
        let created_at = snapshot.created_at.unwrap_or(now);
        Ok(Market {
            id: snapshot.id,
            question: snapshot.question,
            outcomes,
            outcome_prices,
            volume: snapshot.volume,
            active: snapshot.active,
            volatility,
            volatility_method,
            created_at,
            updated_at: snapshot.updated_at.unwrap_or(created_at),
        })
    }
}
