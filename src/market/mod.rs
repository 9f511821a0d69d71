//! Market data model
//!
//! Immutable binary market snapshots and the relationship judgment supplied
//! for a pair of them by the embedding/reasoning collaborators.

mod snapshot;

pub use snapshot::MarketSnapshot;

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label of the outcome read as the market's implied probability
pub const YES_LABEL: &str = "Yes";
/// Label of the complementary outcome
pub const NO_LABEL: &str = "No";

/// How a market's volatility estimate was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityMethod {
    /// Realized volatility from CLOB price history
    PriceHistory,
    /// Absolute 24h price change
    #[serde(rename = "price_change_24h")]
    PriceChange24h,
    /// 7d price change scaled to 24h by sqrt(7)
    #[serde(rename = "price_change_7d_scaled")]
    PriceChange7dScaled,
    /// 30d price change scaled to 24h by sqrt(30)
    #[serde(rename = "price_change_30d_scaled")]
    PriceChange30dScaled,
    /// Price uncertainty, volume and time-to-close blend; no price data
    Proxy,
    /// No method recorded
    #[default]
    Unknown,
}

/// A Polymarket binary market snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Unique market identifier
    pub id: String,
    /// Question text
    pub question: String,
    /// Ordered outcome labels
    pub outcomes: Vec<String>,
    /// Outcome prices aligned with `outcomes`
    pub outcome_prices: Vec<Decimal>,
    /// Traded volume in USD
    pub volume: Decimal,
    /// Whether the market is still trading
    pub active: bool,
    /// Normalized volatility estimate, `None` if not computed
    pub volatility: Option<Decimal>,
    /// How `volatility` was computed
    pub volatility_method: VolatilityMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    /// Create a Yes/No market from its YES price, with NO priced as the complement
    pub fn binary(id: impl Into<String>, yes_price: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            question: String::new(),
            outcomes: vec![YES_LABEL.to_string(), NO_LABEL.to_string()],
            outcome_prices: vec![yes_price, Decimal::ONE - yes_price],
            volume: Decimal::ZERO,
            active: true,
            volatility: None,
            volatility_method: VolatilityMethod::Unknown,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a volatility estimate
    pub fn with_volatility(mut self, volatility: Decimal, method: VolatilityMethod) -> Self {
        self.volatility = Some(volatility);
        self.volatility_method = method;
        self
    }

    /// Price of the outcome labelled `label` (case-insensitive)
    pub fn price_of(&self, label: &str) -> Option<Decimal> {
        self.outcomes
            .iter()
            .position(|o| o.eq_ignore_ascii_case(label))
            .and_then(|i| self.outcome_prices.get(i).copied())
    }
}

/// Relationship judgment for a market pair
///
/// Produced by the embedding/clustering and reasoning collaborators. The
/// engine treats a cached judgment and a freshly computed one identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipJudgment {
    /// Correlation coefficient in [-1, 1]; the sign encodes direction
    pub correlation: f64,
    /// Embedding similarity in [0, 1]
    pub similarity: f64,
    /// Opaque explanation text, passed through untouched
    #[serde(default)]
    pub explanation: String,
}

impl RelationshipJudgment {
    /// Reject coefficients outside their ranges before any math runs
    pub fn validate(&self) -> Result<()> {
        if !self.correlation.is_finite() || !(-1.0..=1.0).contains(&self.correlation) {
            return Err(EngineError::InvalidCorrelation(self.correlation));
        }
        if !self.similarity.is_finite() || !(0.0..=1.0).contains(&self.similarity) {
            return Err(EngineError::InvalidSimilarity(self.similarity));
        }
        Ok(())
    }
}

/// Two related markets plus their relationship judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPair {
    pub market1: Market,
    pub market2: Market,
    pub judgment: RelationshipJudgment,
}

impl MarketPair {
    pub fn new(market1: Market, market2: Market, judgment: RelationshipJudgment) -> Self {
        Self {
            market1,
            market2,
            judgment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_binary_market_prices() {
        let market = Market::binary("m1", dec!(0.815));
        assert_eq!(market.price_of("Yes"), Some(dec!(0.815)));
        assert_eq!(market.price_of("no"), Some(dec!(0.185)));
        assert!(market.volatility.is_none());
    }

    #[test]
    fn test_price_of_missing_label() {
        let market = Market::binary("m1", dec!(0.5));
        assert_eq!(market.price_of("Maybe"), None);
    }

    #[test]
    fn test_volatility_method_serde() {
        let json = serde_json::to_string(&VolatilityMethod::PriceChange7dScaled).unwrap();
        assert_eq!(json, "\"price_change_7d_scaled\"");
        let method: VolatilityMethod = serde_json::from_str("\"price_history\"").unwrap();
        assert_eq!(method, VolatilityMethod::PriceHistory);
    }

    #[test]
    fn test_judgment_defaults() {
        let judgment: RelationshipJudgment =
            serde_json::from_str(r#"{"correlation": -0.4, "similarity": 0.6}"#).unwrap();
        assert_eq!(judgment.correlation, -0.4);
        assert!(judgment.explanation.is_empty());
        assert!(judgment.validate().is_ok());
    }

    #[test]
    fn test_judgment_requires_similarity() {
        let parsed = serde_json::from_str::<RelationshipJudgment>(r#"{"correlation": -0.4}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_judgment_validate_ranges() {
        let judgment = |correlation: f64, similarity: f64| RelationshipJudgment {
            correlation,
            similarity,
            explanation: String::new(),
        };
        assert_eq!(
            judgment(0.5, 1.3).validate(),
            Err(EngineError::InvalidSimilarity(1.3))
        );
        assert_eq!(
            judgment(0.5, -0.1).validate(),
            Err(EngineError::InvalidSimilarity(-0.1))
        );
        assert!(judgment(0.5, f64::NAN).validate().is_err());
        assert_eq!(
            judgment(-1.2, 0.5).validate(),
            Err(EngineError::InvalidCorrelation(-1.2))
        );
        assert!(judgment(-1.0, 0.0).validate().is_ok());
        assert!(judgment(1.0, 1.0).validate().is_ok());
    }
}
