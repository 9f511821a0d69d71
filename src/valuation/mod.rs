//! Expected value aggregation
//!
//! Combines joint probabilities and scenario payoffs into the expected
//! profit, stake, best and worst case of each position combination.

use crate::model::{JointProbabilities, Scenario, ScenarioValues, PROBABILITY_TOLERANCE};
use crate::payoff::{scenario_payoffs, PositionCombo, Side};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Expected values closer than this are treated as tied
pub const EV_TIE_TOLERANCE: f64 = 1e-9;

/// Valuation of one position combination on a market pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedValueResult {
    /// Positions held on market1 and market2
    pub combo: PositionCombo,
    /// Expected profit, sum of probability times payoff over the scenarios
    pub expected_value: f64,
    /// Price paid for both legs
    pub total_stake: f64,
    /// Expected profit per unit of stake
    pub return_on_stake: f64,
    /// Joint probability per scenario
    pub probabilities: JointProbabilities,
    /// Combined payoff per scenario
    pub payoffs: ScenarioValues,
    /// Highest scenario payoff
    pub best_case: f64,
    /// Lowest scenario payoff
    pub worst_case: f64,
    /// Lowest payoff among scenarios with non-negligible probability
    pub reachable_worst_case: f64,
    /// YES price of market1
    pub market1_price: f64,
    /// YES price of market2
    pub market2_price: f64,
    /// Correlation coefficient used for the joint probabilities
    pub correlation_used: f64,
}

impl ExpectedValueResult {
    /// Worst reachable loss per unit of stake, weighted by the probability
    /// of landing in a worst-case scenario
    ///
    /// 0 when nothing is at risk. A full-stake loss that is certain scores 1;
    /// the same loss in a 20% tail scores 0.2.
    pub fn loss_fraction(&self) -> f64 {
        let loss = (-self.reachable_worst_case).max(0.0);
        if self.total_stake <= 0.0 || loss == 0.0 {
            return 0.0;
        }
        let worst_probability: f64 = Scenario::ALL
            .iter()
            .filter(|s| {
                (self.payoffs.get(**s) - self.reachable_worst_case).abs() <= EV_TIE_TOLERANCE
            })
            .map(|s| self.probabilities.get(*s))
            .sum();
        (loss / self.total_stake * worst_probability).min(1.0)
    }
}

/// Probability-weighted payoff
pub fn expected_value(probabilities: &JointProbabilities, payoffs: &ScenarioValues) -> f64 {
    probabilities
        .to_array()
        .iter()
        .zip(payoffs.to_array().iter())
        .map(|(p, v)| p * v)
        .sum()
}

/// Value one position combination
pub fn evaluate(
    combo: PositionCombo,
    p1: f64,
    p2: f64,
    correlation: f64,
    probabilities: JointProbabilities,
) -> ExpectedValueResult {
    let payoffs = scenario_payoffs(combo, p1, p2);
    let ev = expected_value(&probabilities, &payoffs);
    let total_stake = combo.stake(p1, p2);

    let values = payoffs.to_array();
    let best_case = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let worst_case = values.iter().copied().fold(f64::INFINITY, f64::min);
    let reachable_worst_case = probabilities
        .to_array()
        .iter()
        .zip(values.iter())
        .filter(|(p, _)| **p > PROBABILITY_TOLERANCE)
        .map(|(_, v)| *v)
        .fold(f64::INFINITY, f64::min);

    ExpectedValueResult {
        combo,
        expected_value: ev,
        total_stake,
        return_on_stake: if total_stake > 0.0 { ev / total_stake } else { 0.0 },
        probabilities,
        payoffs,
        best_case,
        worst_case,
        // Only reachable when every cell is below tolerance, which stabilize() rules out
        reachable_worst_case: if reachable_worst_case.is_finite() {
            reachable_worst_case
        } else {
            worst_case
        },
        market1_price: p1,
        market2_price: p2,
        correlation_used: correlation,
    }
}

/// Value all four combinations, ranked best first
pub fn evaluate_all(
    p1: f64,
    p2: f64,
    correlation: f64,
    probabilities: JointProbabilities,
) -> [ExpectedValueResult; 4] {
    let mut results =
        PositionCombo::ALL.map(|combo| evaluate(combo, p1, p2, correlation, probabilities));
    results.sort_by(compare_candidates);
    results
}

/// Pick the recommended combination
///
/// Highest expected value wins; near-ties go to the lower stake, then to the
/// lexically smaller combination label.
pub fn select_best(results: &[ExpectedValueResult]) -> Option<&ExpectedValueResult> {
    results.iter().min_by(|a, b| compare_candidates(a, b))
}

fn compare_candidates(a: &ExpectedValueResult, b: &ExpectedValueResult) -> Ordering {
    quantize(b.expected_value)
        .total_cmp(&quantize(a.expected_value))
        .then_with(|| quantize(a.total_stake).total_cmp(&quantize(b.total_stake)))
        .then_with(|| a.combo.label().cmp(&b.combo.label()))
}

/// Snap to the tie tolerance grid so near-equal values compare equal and the
/// ordering stays transitive
fn quantize(value: f64) -> f64 {
    // + 0.0 folds -0.0 into 0.0, which total_cmp would otherwise order apart
    (value / EV_TIE_TOLERANCE).round() + 0.0
}

/// Model edge of each single leg: win probability minus price paid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegEdges {
    pub yes_market1: f64,
    pub no_market1: f64,
    pub yes_market2: f64,
    pub no_market2: f64,
}

impl LegEdges {
    /// The single leg with the largest edge
    pub fn best(&self) -> (Side, usize, f64) {
        [
            (Side::Yes, 1, self.yes_market1),
            (Side::No, 1, self.no_market1),
            (Side::Yes, 2, self.yes_market2),
            (Side::No, 2, self.no_market2),
        ]
        .into_iter()
        .fold((Side::Yes, 1, f64::NEG_INFINITY), |best, leg| {
            if leg.2 > best.2 + EV_TIE_TOLERANCE {
                leg
            } else {
                best
            }
        })
    }
}

/// Per-leg edges under the joint model
pub fn leg_edges(p1: f64, p2: f64, probabilities: &JointProbabilities) -> LegEdges {
    let q1 = probabilities.market1_yes();
    let q2 = probabilities.market2_yes();
    LegEdges {
        yes_market1: q1 - p1,
        no_market1: (1.0 - q1) - (1.0 - p1),
        yes_market2: q2 - p2,
        no_market2: (1.0 - q2) - (1.0 - p2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::joint_probabilities;

    fn worked_example() -> [ExpectedValueResult; 4] {
        let probs = joint_probabilities(0.815, 0.18, 0.9).unwrap();
        evaluate_all(0.815, 0.18, 0.9, probs)
    }

    #[test]
    fn test_expected_value_sum() {
        let probs = ScenarioValues::from_array([0.25, 0.25, 0.25, 0.25]);
        let payoffs = ScenarioValues::from_array([1.0, -1.0, 2.0, 0.0]);
        assert!((expected_value(&probs, &payoffs) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_worked_example_recommendation() {
        let results = worked_example();
        let best = select_best(&results).unwrap();
        assert_eq!(best.combo, PositionCombo::new(Side::No, Side::Yes));
        assert!((best.total_stake - 0.365).abs() < 1e-9);
        assert!((best.best_case - 1.635).abs() < 1e-9);
        assert!((best.worst_case + 0.365).abs() < 1e-9);
        assert!(best.expected_value.abs() < 1e-9);
    }

    #[test]
    fn test_ranked_order_matches_selection() {
        let results = worked_example();
        assert_eq!(results.len(), 4);
        assert_eq!(&results[0], select_best(&results).unwrap());
        // All combos tie at zero EV, so stake decides
        for pair in results.windows(2) {
            assert!(pair[0].total_stake <= pair[1].total_stake + EV_TIE_TOLERANCE);
        }
    }

    #[test]
    fn test_ev_reproducible_from_vectors() {
        for result in worked_example() {
            let recomputed: f64 = crate::model::Scenario::ALL
                .iter()
                .map(|s| result.probabilities.get(*s) * result.payoffs.get(*s))
                .sum();
            assert_eq!(recomputed, result.expected_value);
        }
    }

    #[test]
    fn test_higher_ev_beats_lower_stake() {
        let probs = ScenarioValues::from_array([0.7, 0.1, 0.1, 0.1]);
        // Model says both YES far more likely than prices imply
        let results = evaluate_all(0.3, 0.3, 0.5, probs);
        let best = select_best(&results).unwrap();
        assert_eq!(best.combo, PositionCombo::new(Side::Yes, Side::Yes));
        assert!(best.expected_value > 0.0);
    }

    #[test]
    fn test_lexical_tie_break() {
        // Symmetric prices: YES/NO and NO/YES share stake and EV
        let probs = joint_probabilities(0.5, 0.5, 0.0).unwrap();
        let results = evaluate_all(0.5, 0.5, 0.0, probs);
        let best = select_best(&results).unwrap();
        assert_eq!(best.combo.label(), "NO/NO");
    }

    #[test]
    fn test_reachable_worst_case_on_perfect_hedge() {
        let probs = joint_probabilities(0.4, 0.4, 1.0).unwrap();
        let hedge = evaluate(PositionCombo::new(Side::Yes, Side::No), 0.4, 0.4, 1.0, probs);
        assert!((hedge.worst_case + 1.0).abs() < 1e-9);
        assert!(hedge.reachable_worst_case.abs() < 1e-9);
        assert!(hedge.loss_fraction() < 1e-9);
    }

    #[test]
    fn test_leg_edges_zero_without_clamping() {
        let probs = joint_probabilities(0.6, 0.3, 0.4).unwrap();
        let edges = leg_edges(0.6, 0.3, &probs);
        assert!(edges.yes_market1.abs() < 1e-9);
        assert!(edges.no_market2.abs() < 1e-9);
    }

    #[test]
    fn test_leg_edges_best() {
        let probs = ScenarioValues::from_array([0.5, 0.2, 0.1, 0.2]);
        let edges = leg_edges(0.5, 0.5, &probs);
        // market1 YES is 0.7 under the model against a 0.5 price
        let (side, market, edge) = edges.best();
        assert_eq!((side, market), (Side::Yes, 1));
        assert!((edge - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_loss_fraction_weights_worst_case_by_probability() {
        let results = worked_example();
        // NO/YES loses its whole 0.365 stake only when market1 YES and
        // market2 NO, which the model puts at 0.635
        assert!((results[0].loss_fraction() - 0.635).abs() < 1e-9);

        let probs = joint_probabilities(0.1, 0.1, 0.0).unwrap();
        let longshot = evaluate(PositionCombo::new(Side::Yes, Side::Yes), 0.1, 0.1, 0.0, probs);
        assert!((longshot.loss_fraction() - 0.81).abs() < 1e-9);
    }

    #[test]
    fn test_near_ties_order_consistently() {
        let base = worked_example()[0];
        let candidates = [
            ExpectedValueResult {
                combo: PositionCombo::new(Side::Yes, Side::Yes),
                expected_value: 0.0,
                total_stake: 0.5,
                ..base
            },
            ExpectedValueResult {
                combo: PositionCombo::new(Side::Yes, Side::No),
                expected_value: 0.6e-9,
                total_stake: 0.7,
                ..base
            },
            ExpectedValueResult {
                combo: PositionCombo::new(Side::No, Side::Yes),
                expected_value: 1.2e-9,
                total_stake: 0.9,
                ..base
            },
        ];

        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let mut winners = Vec::new();
        for order in orders {
            let mut shuffled: Vec<ExpectedValueResult> =
                order.iter().map(|i| candidates[*i]).collect();
            let best = *select_best(&shuffled).unwrap();
            shuffled.sort_by(compare_candidates);
            assert_eq!(shuffled[0], best);
            winners.push(best.combo);
        }
        assert!(winners.iter().all(|combo| *combo == winners[0]));
    }
}
