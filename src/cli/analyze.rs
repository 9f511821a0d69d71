//! Analyze command implementation

use super::OutputFormat;
use crate::config::Config;
use crate::engine::{CorrelationEngine, PairAnalysis};
use crate::market::{MarketPair, MarketSnapshot, RelationshipJudgment};
use crate::model::Scenario;
use clap::Args;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// JSON file with `market1`, `market2` snapshots and a `judgment`
    pub input: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Single pair input file
#[derive(Debug, Deserialize)]
struct PairInput {
    market1: MarketSnapshot,
    market2: MarketSnapshot,
    judgment: RelationshipJudgment,
}

impl AnalyzeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = CorrelationEngine::from_config(config)?;

        let content = std::fs::read_to_string(&self.input)?;
        let input: PairInput = serde_json::from_str(&content)?;
        let pair = MarketPair::new(
            input.market1.into_market(config.model.proxy_volatility)?,
            input.market2.into_market(config.model.proxy_volatility)?,
            input.judgment,
        );

        tracing::info!(
            market1 = %pair.market1.id,
            market2 = %pair.market2.id,
            correlation = pair.judgment.correlation,
            "Analyzing pair"
        );
        let analysis = engine.analyze(&pair)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
            OutputFormat::Table => print!("{}", render_table(&analysis)),
        }
        Ok(())
    }
}

/// Human-readable summary of one analysis
pub(crate) fn render_table(analysis: &PairAnalysis) -> String {
    let ev = &analysis.expected_value;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} <-> {}  (correlation {:+.3}, similarity {:.3})",
        analysis.market1_id, analysis.market2_id, analysis.correlation, analysis.similarity
    );
    let _ = writeln!(
        out,
        "  prices: {:.4} / {:.4}   pressure: {}",
        ev.market1_price,
        ev.market2_price,
        analysis
            .pressure
            .map(|p| format!("{p:.4}"))
            .unwrap_or_else(|| "unknown".to_string())
    );
    let _ = writeln!(out, "  {:<10} {:>10} {:>10}", "scenario", "prob", "payoff");
    for scenario in Scenario::ALL {
        let _ = writeln!(
            out,
            "  {:<10} {:>10.4} {:>+10.4}",
            scenario_label(scenario),
            ev.probabilities.get(scenario),
            ev.payoffs.get(scenario)
        );
    }
    let (side, market, edge) = analysis.leg_edges.best();
    let _ = writeln!(out, "  best single leg: {side} on market{market} ({edge:+.4})");
    let _ = writeln!(
        out,
        "  score {:.3}  risk {}",
        analysis.verdict.investment_score, analysis.verdict.risk_level
    );
    let _ = writeln!(out, "  {}", analysis.verdict.recommended_strategy);
    out
}

fn scenario_label(scenario: Scenario) -> &'static str {
    match scenario {
        Scenario::BothYes => "YES/YES",
        Scenario::YesNo => "YES/NO",
        Scenario::NoYes => "NO/YES",
        Scenario::BothNo => "NO/NO",
    }
}
