//! Probability model module
//!
//! Converts market prices to implied probabilities and derives the joint
//! outcome distribution of a market pair under a correlation coefficient.

mod probability;
mod volatility;

pub use probability::{
    implied_probability, joint_probabilities, joint_probabilities_within, raw_joint, stabilize,
    LinearCorrelationModel, Stabilized,
};
pub use volatility::{estimate_from_price_changes, estimate_proxy, VolatilityEstimator};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Default tolerance for the joint probabilities summing to 1, also the
/// probability below which a scenario counts as unreachable
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// One of the four joint outcomes of a binary market pair, market1 first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    BothYes,
    YesNo,
    NoYes,
    BothNo,
}

impl Scenario {
    /// All scenarios in table order
    pub const ALL: [Scenario; 4] = [
        Scenario::BothYes,
        Scenario::YesNo,
        Scenario::NoYes,
        Scenario::BothNo,
    ];

    /// Whether market1 resolves YES in this scenario
    pub fn market1_yes(self) -> bool {
        matches!(self, Scenario::BothYes | Scenario::YesNo)
    }

    /// Whether market2 resolves YES in this scenario
    pub fn market2_yes(self) -> bool {
        matches!(self, Scenario::BothYes | Scenario::NoYes)
    }
}

/// A value per joint scenario
///
/// Used for both the joint probabilities and the scenario payoffs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScenarioValues {
    pub both_yes: f64,
    pub yes_no: f64,
    pub no_yes: f64,
    pub both_no: f64,
}

/// Joint outcome probabilities of a market pair
pub type JointProbabilities = ScenarioValues;

impl ScenarioValues {
    /// Build from a function of the scenario
    pub fn from_fn(mut f: impl FnMut(Scenario) -> f64) -> Self {
        Self {
            both_yes: f(Scenario::BothYes),
            yes_no: f(Scenario::YesNo),
            no_yes: f(Scenario::NoYes),
            both_no: f(Scenario::BothNo),
        }
    }

    pub fn from_array([both_yes, yes_no, no_yes, both_no]: [f64; 4]) -> Self {
        Self {
            both_yes,
            yes_no,
            no_yes,
            both_no,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.both_yes, self.yes_no, self.no_yes, self.both_no]
    }

    pub fn get(&self, scenario: Scenario) -> f64 {
        match scenario {
            Scenario::BothYes => self.both_yes,
            Scenario::YesNo => self.yes_no,
            Scenario::NoYes => self.no_yes,
            Scenario::BothNo => self.both_no,
        }
    }

    pub fn sum(&self) -> f64 {
        self.to_array().iter().sum()
    }

    /// Probability that market1 resolves YES
    pub fn market1_yes(&self) -> f64 {
        self.both_yes + self.yes_no
    }

    /// Probability that market2 resolves YES
    pub fn market2_yes(&self) -> f64 {
        self.both_yes + self.no_yes
    }
}

/// Trait for joint-distribution models of two binary markets
pub trait DependenceModel: Send + Sync {
    /// Joint probabilities given YES marginals and a correlation coefficient
    fn joint(&self, p1: f64, p2: f64, correlation: f64) -> Result<JointProbabilities>;
}
