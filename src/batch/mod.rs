//! Batch evaluation of candidate pairs
//!
//! Resolves a relationship judgment for every candidate pair and runs the
//! engine on each, with at most `max_concurrency` pairs in flight. Pair
//! evaluations are independent; results are ordered by investment score.

mod source;

pub use source::{JudgedPair, JudgmentSource, StaticJudgments};

use crate::engine::{CorrelationEngine, PairAnalysis};
use crate::market::{Market, MarketPair};
use crate::model::DependenceModel;
use crate::telemetry::{increment, record_latency, set_in_flight, CounterMetric, LatencyMetric};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Instant;

/// A neighbor pair proposed by the clustering collaborator
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub market1: Market,
    pub market2: Market,
}

impl CandidatePair {
    pub fn new(market1: Market, market2: Market) -> Self {
        Self { market1, market2 }
    }
}

/// Why a pair produced no analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFailure {
    pub market1_id: String,
    pub market2_id: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Successful analyses, highest investment score first
    pub analyses: Vec<PairAnalysis>,
    /// Pairs that were skipped or rejected
    pub failures: Vec<PairFailure>,
}

/// Runs the engine over many candidate pairs
pub struct BatchAnalyzer<'a, M: DependenceModel> {
    engine: &'a CorrelationEngine<M>,
    source: &'a dyn JudgmentSource,
    max_concurrency: usize,
}

impl<'a, M: DependenceModel> BatchAnalyzer<'a, M> {
    pub fn new(
        engine: &'a CorrelationEngine<M>,
        source: &'a dyn JudgmentSource,
        max_concurrency: usize,
    ) -> Self {
        Self {
            engine,
            source,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Evaluate all candidates
    pub async fn run(&self, candidates: Vec<CandidatePair>) -> BatchReport {
        let total = candidates.len();
        let in_flight = AtomicUsize::new(0);
        tracing::info!(
            pairs = total,
            max_concurrency = self.max_concurrency,
            "Starting batch analysis"
        );

        let outcomes: Vec<Result<PairAnalysis, PairFailure>> = stream::iter(candidates)
            .map(|candidate| {
                let in_flight = &in_flight;
                async move {
                    set_in_flight(in_flight.fetch_add(1, AtomicOrdering::SeqCst) + 1);
                    let outcome = self.evaluate(candidate).await;
                    set_in_flight(in_flight.fetch_sub(1, AtomicOrdering::SeqCst) - 1);
                    outcome
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(analysis) => report.analyses.push(analysis),
                Err(failure) => report.failures.push(failure),
            }
        }

        report.analyses.sort_by(compare_analyses);
        report.failures.sort_by(|a, b| {
            (&a.market1_id, &a.market2_id).cmp(&(&b.market1_id, &b.market2_id))
        });

        tracing::info!(
            pairs = total,
            analyzed = report.analyses.len(),
            failed = report.failures.len(),
            "Batch analysis complete"
        );
        report
    }

    async fn evaluate(&self, candidate: CandidatePair) -> Result<PairAnalysis, PairFailure> {
        let failure = |reason: String| PairFailure {
            market1_id: candidate.market1.id.clone(),
            market2_id: candidate.market2.id.clone(),
            reason,
        };

        let start = Instant::now();
        let lookup = self
            .source
            .judgment(&candidate.market1, &candidate.market2)
            .await;
        record_latency(LatencyMetric::JudgmentLookup, start.elapsed());

        let judgment = match lookup {
            Ok(Some(judgment)) => judgment,
            Ok(None) => {
                increment(CounterMetric::JudgmentsMissing);
                return Err(failure("no relationship judgment".to_string()));
            }
            Err(e) => {
                tracing::warn!(
                    market1 = %candidate.market1.id,
                    market2 = %candidate.market2.id,
                    error = %e,
                    "Judgment lookup failed"
                );
                return Err(failure(format!("judgment lookup failed: {e}")));
            }
        };

        let pair = MarketPair::new(
            candidate.market1.clone(),
            candidate.market2.clone(),
            judgment,
        );
        self.engine
            .analyze(&pair)
            .map_err(|e| failure(e.to_string()))
    }
}

fn compare_analyses(a: &PairAnalysis, b: &PairAnalysis) -> Ordering {
    b.verdict
        .investment_score
        .partial_cmp(&a.verdict.investment_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.market1_id.cmp(&b.market1_id))
        .then_with(|| a.market2_id.cmp(&b.market2_id))
}
