//! Investment ranking
//!
//! Folds relationship strength, expected value and pressure into a bounded
//! investment score, a discrete risk label and a templated strategy line.
//! Pure and synchronous: no I/O happens here.

use crate::config::{RankingConfig, RiskConfig};
use crate::error::{EngineError, Result};
use crate::valuation::ExpectedValueResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Terminal verdict for a market pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentVerdict {
    /// Composite score in [0, 1]
    pub investment_score: f64,
    pub risk_level: RiskLevel,
    pub recommended_strategy: String,
}

/// Scores market pairs from already-computed numeric inputs
#[derive(Debug, Clone)]
pub struct InvestmentRanker {
    correlation_weight: f64,
    ev_weight: f64,
    ev_scale: f64,
    low_pressure: f64,
    high_pressure: f64,
    low_loss_fraction: f64,
    high_loss_fraction: f64,
}

impl InvestmentRanker {
    /// Build a ranker, failing fast on inconsistent weights or thresholds
    pub fn new(ranking: &RankingConfig, risk: &RiskConfig) -> Result<Self> {
        ranking.validate()?;
        risk.validate()?;

        Ok(Self {
            correlation_weight: to_f64("correlation_weight", ranking.correlation_weight)?,
            ev_weight: to_f64("ev_weight", ranking.ev_weight)?,
            ev_scale: to_f64("ev_scale", ranking.ev_scale)?,
            low_pressure: to_f64("low_pressure", risk.low_pressure)?,
            high_pressure: to_f64("high_pressure", risk.high_pressure)?,
            low_loss_fraction: to_f64("low_loss_fraction", risk.low_loss_fraction)?,
            high_loss_fraction: to_f64("high_loss_fraction", risk.high_loss_fraction)?,
        })
    }

    /// Rank a pair
    ///
    /// `correlation` takes precedence over `similarity` as the relationship
    /// strength when supplied. The market ids only feed the strategy line.
    pub fn rank(
        &self,
        market_ids: (&str, &str),
        similarity: f64,
        correlation: Option<f64>,
        ev: &ExpectedValueResult,
        pressure: Option<f64>,
    ) -> InvestmentVerdict {
        let strength = relationship_strength(similarity, correlation);
        let ev_component = self.ev_component(ev);
        let investment_score =
            (self.correlation_weight * strength + self.ev_weight * ev_component).clamp(0.0, 1.0);

        InvestmentVerdict {
            investment_score,
            risk_level: self.risk_level(ev, pressure),
            recommended_strategy: strategy_text(ev, market_ids),
        }
    }

    /// EV relative to stake, scaled and clamped to [0, 1]
    pub fn ev_component(&self, ev: &ExpectedValueResult) -> f64 {
        if ev.total_stake <= 0.0 || !ev.return_on_stake.is_finite() {
            return 0.0;
        }
        (ev.return_on_stake * self.ev_scale).clamp(0.0, 1.0)
    }

    /// Risk label from pressure and the probability-weighted worst loss
    pub fn risk_level(&self, ev: &ExpectedValueResult, pressure: Option<f64>) -> RiskLevel {
        let loss = ev.loss_fraction();
        match pressure {
            None => RiskLevel::High,
            Some(p) if p > self.high_pressure || loss > self.high_loss_fraction => RiskLevel::High,
            Some(p) if p < self.low_pressure && loss <= self.low_loss_fraction => RiskLevel::Low,
            Some(_) => RiskLevel::Medium,
        }
    }
}

fn to_f64(name: &str, value: Decimal) -> Result<f64> {
    f64::try_from(value)
        .map_err(|_| EngineError::InvalidConfig(format!("{name} {value} not representable")))
}

/// |correlation| when supplied, otherwise similarity, clamped to [0, 1]
pub fn relationship_strength(similarity: f64, correlation: Option<f64>) -> f64 {
    let raw = match correlation {
        Some(rho) if rho.is_finite() => rho.abs(),
        _ => similarity,
    };
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Deterministic strategy line for a valued combination
pub fn strategy_text(ev: &ExpectedValueResult, (market1_id, market2_id): (&str, &str)) -> String {
    let edge = if ev.expected_value > 0.05 {
        "strong positive edge"
    } else if ev.expected_value > 0.01 {
        "moderate positive edge"
    } else if ev.expected_value > 1e-9 {
        "slight positive edge"
    } else {
        "no positive edge, prices consistent with the joint model"
    };

    format!(
        "Bet {} on market1 ({}) and {} on market2 ({}): expected profit {:+.4} on stake {:.4} \
         ({:+.2}%), best case {:+.4}, worst case {:+.4} ({})",
        ev.combo.market1,
        market1_id,
        ev.combo.market2,
        market2_id,
        ev.expected_value,
        ev.total_stake,
        ev.return_on_stake * 100.0,
        ev.best_case,
        ev.worst_case,
        edge
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{joint_probabilities, ScenarioValues};
    use crate::payoff::{PositionCombo, Side};
    use crate::valuation::{evaluate, evaluate_all, select_best};
    use rust_decimal_macros::dec;

    const IDS: (&str, &str) = ("will-x", "will-y");

    fn ranker() -> InvestmentRanker {
        InvestmentRanker::new(&RankingConfig::default(), &RiskConfig::default()).unwrap()
    }

    fn worked_example() -> ExpectedValueResult {
        let probs = joint_probabilities(0.815, 0.18, 0.9).unwrap();
        let results = evaluate_all(0.815, 0.18, 0.9, probs);
        *select_best(&results).unwrap()
    }

    fn best_at(p1: f64, p2: f64, rho: f64) -> ExpectedValueResult {
        let probs = joint_probabilities(p1, p2, rho).unwrap();
        evaluate_all(p1, p2, rho, probs)[0]
    }

    fn perfect_hedge() -> ExpectedValueResult {
        let probs = joint_probabilities(0.4, 0.4, 1.0).unwrap();
        evaluate(PositionCombo::new(Side::Yes, Side::No), 0.4, 0.4, 1.0, probs)
    }

    #[test]
    fn test_invalid_weights_fail_construction() {
        let ranking = RankingConfig {
            correlation_weight: dec!(0.6),
            ev_weight: dec!(0.3),
            ..RankingConfig::default()
        };
        let err = InvestmentRanker::new(&ranking, &RiskConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_pressure_is_high_risk() {
        let verdict = ranker().rank(IDS, 0.9, Some(0.9), &perfect_hedge(), None);
        assert_eq!(verdict.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_calm_hedge_is_low_risk() {
        let verdict = ranker().rank(IDS, 0.9, Some(1.0), &perfect_hedge(), Some(0.01));
        assert_eq!(verdict.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_moderate_pressure_is_medium_risk() {
        let verdict = ranker().rank(IDS, 0.9, Some(1.0), &perfect_hedge(), Some(0.1));
        assert_eq!(verdict.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_high_pressure_is_high_risk() {
        let verdict = ranker().rank(IDS, 0.9, Some(1.0), &perfect_hedge(), Some(0.3));
        assert_eq!(verdict.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_likely_full_loss_is_high_risk() {
        // Two longshots: the whole 0.2 stake is lost with probability 0.81
        let verdict = ranker().rank(IDS, 0.8, Some(0.0), &best_at(0.1, 0.1, 0.0), Some(0.0));
        assert_eq!(verdict.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_every_label_reachable_with_defaults() {
        let ranker = ranker();
        // NO/NO on two coin flips loses the stake only when both resolve YES
        let calm = best_at(0.5, 0.5, -0.2);
        assert_eq!(calm.combo, PositionCombo::new(Side::No, Side::No));
        assert_eq!(ranker.risk_level(&calm, Some(0.0)), RiskLevel::Low);
        assert_eq!(ranker.risk_level(&worked_example(), Some(0.0)), RiskLevel::Medium);
        assert_eq!(ranker.risk_level(&best_at(0.1, 0.1, 0.0), Some(0.0)), RiskLevel::High);
    }

    #[test]
    fn test_score_from_correlation_only_when_ev_zero() {
        let verdict = ranker().rank(IDS, 0.2, Some(-0.9), &worked_example(), Some(0.0));
        // 0.6 * 0.9 + 0.4 * 0
        assert!((verdict.investment_score - 0.54).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_used_without_correlation() {
        assert_eq!(relationship_strength(0.7, None), 0.7);
        assert_eq!(relationship_strength(0.7, Some(-0.3)), 0.3);
        assert_eq!(relationship_strength(1.5, None), 1.0);
    }

    #[test]
    fn test_score_bounded_with_large_ev() {
        let probs = ScenarioValues::from_array([0.7, 0.1, 0.1, 0.1]);
        let ev = evaluate(PositionCombo::new(Side::Yes, Side::Yes), 0.3, 0.3, 1.0, probs);
        let verdict = ranker().rank(IDS, 1.0, Some(1.0), &ev, Some(0.0));
        assert_eq!(verdict.investment_score, 1.0);
        assert_eq!(ranker().ev_component(&ev), 1.0);
    }

    #[test]
    fn test_negative_ev_contributes_nothing() {
        let probs = ScenarioValues::from_array([0.1, 0.1, 0.1, 0.7]);
        let ev = evaluate(PositionCombo::new(Side::Yes, Side::Yes), 0.5, 0.5, 0.0, probs);
        assert!(ev.expected_value < 0.0);
        assert_eq!(ranker().ev_component(&ev), 0.0);
    }

    #[test]
    fn test_strategy_text() {
        let text = strategy_text(&worked_example(), IDS);
        assert!(text.starts_with("Bet NO on market1 (will-x) and YES on market2 (will-y)"));
        assert!(text.contains("stake 0.3650"));
        assert!(text.contains("best case +1.6350"));
        assert!(text.contains("worst case -0.3650"));
    }

    #[test]
    fn test_rank_is_deterministic() {
        let ev = worked_example();
        let a = ranker().rank(IDS, 0.8, Some(0.9), &ev, Some(0.02));
        let b = ranker().rank(IDS, 0.8, Some(0.9), &ev, Some(0.02));
        assert_eq!(a, b);
    }
}
