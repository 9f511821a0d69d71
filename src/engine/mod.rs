//! Correlation-to-expected-value pipeline
//!
//! Probability model -> payoffs -> expected value -> pressure -> ranking.
//! The engine holds no mutable state and can be shared across tasks.

use crate::config::Config;
use crate::error::Result;
use crate::market::MarketPair;
use crate::model::{implied_probability, DependenceModel, LinearCorrelationModel};
use crate::pressure::PressureScorer;
use crate::ranking::{InvestmentRanker, InvestmentVerdict};
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};
use crate::valuation::{evaluate_all, leg_edges, ExpectedValueResult, LegEdges};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Published analysis of one market pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAnalysis {
    pub market1_id: String,
    pub market2_id: String,
    /// Correlation coefficient from the relationship judgment
    pub correlation: f64,
    /// Similarity score from the relationship judgment
    pub similarity: f64,
    /// Valuation of the recommended position combination
    pub expected_value: ExpectedValueResult,
    /// All four combinations, best first
    pub combinations: Vec<ExpectedValueResult>,
    /// Single-leg edges under the joint model
    pub leg_edges: LegEdges,
    /// Volatility divergence, `None` when unknown
    pub pressure: Option<f64>,
    pub verdict: InvestmentVerdict,
    /// Relationship explanation, passed through untouched
    pub explanation: String,
}

/// Correlation-to-EV engine
pub struct CorrelationEngine<M: DependenceModel = LinearCorrelationModel> {
    model: M,
    scorer: PressureScorer,
    ranker: InvestmentRanker,
}

impl CorrelationEngine<LinearCorrelationModel> {
    /// Build the default engine from validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            LinearCorrelationModel::from_config(&config.model)?,
            PressureScorer::from_config(&config.pressure),
            InvestmentRanker::new(&config.ranking, &config.risk)?,
        ))
    }
}

impl<M: DependenceModel> CorrelationEngine<M> {
    pub fn new(model: M, scorer: PressureScorer, ranker: InvestmentRanker) -> Self {
        Self {
            model,
            scorer,
            ranker,
        }
    }

    /// Analyze one market pair
    pub fn analyze(&self, pair: &MarketPair) -> Result<PairAnalysis> {
        let start = Instant::now();
        let result = self.run(pair);
        record_latency(LatencyMetric::PairAnalysis, start.elapsed());

        match &result {
            Ok(analysis) => {
                increment(CounterMetric::PairsAnalyzed);
                tracing::debug!(
                    market1 = %analysis.market1_id,
                    market2 = %analysis.market2_id,
                    combo = %analysis.expected_value.combo,
                    ev = analysis.expected_value.expected_value,
                    score = analysis.verdict.investment_score,
                    risk = %analysis.verdict.risk_level,
                    "Pair analyzed"
                );
            }
            Err(e) => {
                increment(CounterMetric::PairsRejected);
                tracing::warn!(
                    market1 = %pair.market1.id,
                    market2 = %pair.market2.id,
                    error = %e,
                    "Pair rejected"
                );
            }
        }
        result
    }

    fn run(&self, pair: &MarketPair) -> Result<PairAnalysis> {
        let judgment = &pair.judgment;
        judgment.validate()?;
        let p1 = implied_probability(&pair.market1)?;
        let p2 = implied_probability(&pair.market2)?;
        let probabilities = self.model.joint(p1, p2, judgment.correlation)?;

        // Ranked best first
        let combinations = evaluate_all(p1, p2, judgment.correlation, probabilities);
        let expected_value = combinations[0];

        let pressure = self.scorer.score(&pair.market1, &pair.market2);
        let verdict = self.ranker.rank(
            (pair.market1.id.as_str(), pair.market2.id.as_str()),
            judgment.similarity,
            Some(judgment.correlation),
            &expected_value,
            pressure,
        );

        Ok(PairAnalysis {
            market1_id: pair.market1.id.clone(),
            market2_id: pair.market2.id.clone(),
            correlation: judgment.correlation,
            similarity: judgment.similarity,
            expected_value,
            leg_edges: leg_edges(p1, p2, &probabilities),
            combinations: combinations.to_vec(),
            pressure,
            verdict,
            explanation: judgment.explanation.clone(),
        })
    }
}
