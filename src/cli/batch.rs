//! Batch command implementation

use super::analyze::render_table;
use super::OutputFormat;
use crate::batch::{BatchAnalyzer, BatchReport, CandidatePair, JudgedPair, PairFailure, StaticJudgments};
use crate::config::Config;
use crate::engine::CorrelationEngine;
use crate::market::{Market, MarketSnapshot};
use clap::Args;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// JSON file with `markets` snapshots and judged `pairs`
    pub input: PathBuf,

    /// Override the configured concurrency limit
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Batch input file
#[derive(Debug, Deserialize)]
struct BatchInput {
    markets: Vec<MarketSnapshot>,
    pairs: Vec<JudgedPair>,
}

impl BatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = CorrelationEngine::from_config(config)?;

        let content = std::fs::read_to_string(&self.input)?;
        let input: BatchInput = serde_json::from_str(&content)?;
        let (candidates, mut failures) =
            build_candidates(input.markets, &input.pairs, config.model.proxy_volatility);
        let judgments: StaticJudgments = input.pairs.into_iter().collect();

        let concurrency = self.concurrency.unwrap_or(config.batch.max_concurrency);
        let mut report = BatchAnalyzer::new(&engine, &judgments, concurrency)
            .run(candidates)
            .await;
        report.failures.append(&mut failures);
        report
            .failures
            .sort_by(|a, b| (&a.market1_id, &a.market2_id).cmp(&(&b.market1_id, &b.market2_id)));

        self.print(&report)
    }

    fn print(&self, report: &BatchReport) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
            OutputFormat::Table => {
                for analysis in &report.analyses {
                    println!("{}", render_table(analysis));
                }
                for failure in &report.failures {
                    println!(
                        "FAILED {} <-> {}: {}",
                        failure.market1_id, failure.market2_id, failure.reason
                    );
                }
            }
        }
        Ok(())
    }
}

/// Resolve judged pairs against the market set
///
/// Markets with malformed snapshots are excluded; pairs that reference them
/// or unknown ids become failures.
fn build_candidates(
    snapshots: Vec<MarketSnapshot>,
    pairs: &[JudgedPair],
    proxy_volatility: bool,
) -> (Vec<CandidatePair>, Vec<PairFailure>) {
    let mut markets: HashMap<String, Result<Market, String>> = HashMap::new();
    for snapshot in snapshots {
        let id = snapshot.id.clone();
        let market = snapshot.into_market(proxy_volatility).map_err(|e| {
            tracing::warn!(market = %id, error = %e, "Excluding malformed market");
            e.to_string()
        });
        markets.insert(id, market);
    }

    let lookup = |id: &str| match markets.get(id) {
        Some(Ok(market)) => Ok(market.clone()),
        Some(Err(reason)) => Err(reason.clone()),
        None => Err(format!("unknown market {id}")),
    };

    let mut candidates = Vec::new();
    let mut failures = Vec::new();
    for pair in pairs {
        match (lookup(&pair.market1), lookup(&pair.market2)) {
            (Ok(m1), Ok(m2)) => candidates.push(CandidatePair::new(m1, m2)),
            (Err(reason), _) | (_, Err(reason)) => failures.push(PairFailure {
                market1_id: pair.market1.clone(),
                market2_id: pair.market2.clone(),
                reason,
            }),
        }
    }
    (candidates, failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_candidates() {
        let input: BatchInput = serde_json::from_str(
            r#"{
                "markets": [
                    {"id": "a", "outcomePrices": [0.6, 0.4]},
                    {"id": "b", "outcomePrices": [0.3, 0.7]},
                    {"id": "broken", "outcomePrices": [1.4, -0.4]}
                ],
                "pairs": [
                    {"market1": "a", "market2": "b", "correlation": 0.5, "similarity": 0.5},
                    {"market1": "a", "market2": "broken", "correlation": 0.5, "similarity": 0.5},
                    {"market1": "a", "market2": "ghost", "correlation": 0.5, "similarity": 0.5}
                ]
            }"#,
        )
        .unwrap();

        let (candidates, failures) = build_candidates(input.markets, &input.pairs, false);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].market2.id, "b");
        assert_eq!(failures.len(), 2);
        assert!(failures[0].reason.contains("Invalid market broken"));
        assert_eq!(failures[1].reason, "unknown market ghost");
    }
}
