//! Implied and joint outcome probabilities
//!
//! Joint cells of two correlated Bernoulli variables with marginals p1, p2
//! and linear correlation rho:
//!
//! P(YES, YES) = p1*p2 + rho * sqrt(p1(1-p1) * p2(1-p2))
//!
//! The remaining cells follow by marginal subtraction.

use super::{DependenceModel, JointProbabilities, PROBABILITY_TOLERANCE};
use crate::config::ModelConfig;
use crate::error::{EngineError, Result};
use crate::market::{Market, YES_LABEL};
use rust_decimal::Decimal;

/// Read the YES price of a binary market as its implied probability
pub fn implied_probability(market: &Market) -> Result<f64> {
    if market.outcomes.len() != 2 || market.outcome_prices.len() != 2 {
        return Err(EngineError::invalid_market(
            &market.id,
            format!(
                "expected 2 outcomes with prices, got {} outcomes and {} prices",
                market.outcomes.len(),
                market.outcome_prices.len()
            ),
        ));
    }

    let yes_price = market
        .price_of(YES_LABEL)
        .ok_or_else(|| EngineError::invalid_market(&market.id, "no Yes outcome"))?;

    if yes_price < Decimal::ZERO || yes_price > Decimal::ONE {
        return Err(EngineError::invalid_market(
            &market.id,
            format!("Yes price {yes_price} outside [0, 1]"),
        ));
    }

    f64::try_from(yes_price).map_err(|_| {
        EngineError::invalid_market(&market.id, format!("Yes price {yes_price} not representable"))
    })
}

/// Joint probabilities of two correlated binary outcomes
///
/// Returns the stabilized cells; any correction is logged at warn level.
pub fn joint_probabilities(p1: f64, p2: f64, correlation: f64) -> Result<JointProbabilities> {
    joint_probabilities_within(p1, p2, correlation, PROBABILITY_TOLERANCE)
}

/// [`joint_probabilities`] with an explicit renormalization tolerance
pub fn joint_probabilities_within(
    p1: f64,
    p2: f64,
    correlation: f64,
    tolerance: f64,
) -> Result<JointProbabilities> {
    let raw = raw_joint(p1, p2, correlation)?;
    let stabilized = stabilize(raw, tolerance);
    if stabilized.deviation > tolerance {
        tracing::warn!(
            p1,
            p2,
            correlation,
            deviation = stabilized.deviation,
            renormalized = stabilized.renormalized,
            "Joint probabilities clamped"
        );
    }
    Ok(stabilized.probabilities)
}

/// Unclamped-tail joint cells: only P(YES, YES) is bounded to [0, min(p1, p2)]
pub fn raw_joint(p1: f64, p2: f64, correlation: f64) -> Result<JointProbabilities> {
    if !correlation.is_finite() || !(-1.0..=1.0).contains(&correlation) {
        return Err(EngineError::InvalidCorrelation(correlation));
    }
    for (name, p) in [("p1", p1), ("p2", p2)] {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(EngineError::invalid_market(
                name,
                format!("marginal probability {p} outside [0, 1]"),
            ));
        }
    }

    let spread = (p1 * (1.0 - p1) * p2 * (1.0 - p2)).sqrt();
    let both_yes = (p1 * p2 + correlation * spread).clamp(0.0, p1.min(p2));

    Ok(JointProbabilities {
        both_yes,
        yes_no: p1 - both_yes,
        no_yes: p2 - both_yes,
        both_no: 1.0 - p1 - p2 + both_yes,
    })
}

/// Outcome of the numeric-stability pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stabilized {
    pub probabilities: JointProbabilities,
    /// Total clamp distance plus deviation of the clamped sum from 1
    pub deviation: f64,
    /// Whether the clamped cells were rescaled to sum to 1
    pub renormalized: bool,
}

/// Clamp every cell into [0, 1] and rescale when the sum drifts from 1
pub fn stabilize(raw: JointProbabilities, tolerance: f64) -> Stabilized {
    let cells = raw.to_array();
    let clamped = cells.map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) });

    let clamp_distance: f64 = cells
        .iter()
        .zip(clamped.iter())
        .map(|(r, c)| if r.is_nan() { 1.0 } else { (r - c).abs() })
        .sum();
    let total: f64 = clamped.iter().sum();
    let drift = (total - 1.0).abs();

    let renormalized = drift > tolerance && total > 0.0;
    let probabilities = if renormalized {
        JointProbabilities::from_array(clamped.map(|c| c / total))
    } else {
        JointProbabilities::from_array(clamped)
    };

    Stabilized {
        probabilities,
        deviation: clamp_distance + drift,
        renormalized,
    }
}

/// Linear-correlation dependence model for two binary markets
#[derive(Debug, Clone, Copy)]
pub struct LinearCorrelationModel {
    tolerance: f64,
}

impl Default for LinearCorrelationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearCorrelationModel {
    pub fn new() -> Self {
        Self {
            tolerance: PROBABILITY_TOLERANCE,
        }
    }

    /// Build from validated model configuration
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        let tolerance = f64::try_from(config.tolerance).map_err(|_| {
            EngineError::InvalidConfig(format!(
                "model.tolerance {} not representable",
                config.tolerance
            ))
        })?;
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl DependenceModel for LinearCorrelationModel {
    fn joint(&self, p1: f64, p2: f64, correlation: f64) -> Result<JointProbabilities> {
        joint_probabilities_within(p1, p2, correlation, self.tolerance)
    }
}
