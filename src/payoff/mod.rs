//! Payoff calculator
//!
//! Unit-stake settlement of binary contracts. A share bought at `price`
//! pays 1.00 if its side resolves true:
//! - win: profit = 1 - price
//! - lose: profit = -price

use crate::model::{Scenario, ScenarioValues};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side held on a single market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy Yes shares
    Yes,
    /// Buy No shares
    No,
}

impl Side {
    /// Price paid for one share of this side given the market's YES price
    pub fn price(self, yes_price: f64) -> f64 {
        match self {
            Side::Yes => yes_price,
            Side::No => 1.0 - yes_price,
        }
    }

    /// Whether this side wins when the market resolves `resolved_yes`
    pub fn wins(self, resolved_yes: bool) -> bool {
        match self {
            Side::Yes => resolved_yes,
            Side::No => !resolved_yes,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Yes => "YES",
            Side::No => "NO",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Profit of a unit stake on `side` once the market resolves
pub fn payoff(side: Side, yes_price: f64, resolved_yes: bool) -> f64 {
    let paid = side.price(yes_price);
    if side.wins(resolved_yes) {
        1.0 - paid
    } else {
        -paid
    }
}

/// Positions taken on both markets of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionCombo {
    pub market1: Side,
    pub market2: Side,
}

impl PositionCombo {
    /// All four combinations
    pub const ALL: [PositionCombo; 4] = [
        PositionCombo::new(Side::Yes, Side::Yes),
        PositionCombo::new(Side::Yes, Side::No),
        PositionCombo::new(Side::No, Side::Yes),
        PositionCombo::new(Side::No, Side::No),
    ];

    pub const fn new(market1: Side, market2: Side) -> Self {
        Self { market1, market2 }
    }

    /// Label such as `NO/YES`, market1 first
    pub fn label(&self) -> String {
        format!("{}/{}", self.market1, self.market2)
    }

    /// Total price paid for both legs
    pub fn stake(&self, p1: f64, p2: f64) -> f64 {
        self.market1.price(p1) + self.market2.price(p2)
    }
}

impl fmt::Display for PositionCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.market1, self.market2)
    }
}

/// Combined profit of both legs for every joint outcome
pub fn scenario_payoffs(combo: PositionCombo, p1: f64, p2: f64) -> ScenarioValues {
    ScenarioValues::from_fn(|scenario: Scenario| {
        payoff(combo.market1, p1, scenario.market1_yes())
            + payoff(combo.market2, p2, scenario.market2_yes())
    })
}
