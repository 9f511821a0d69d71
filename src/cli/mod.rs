//! CLI interface for poly-corr
//!
//! Provides subcommands for:
//! - `analyze`: Analyze a single market pair
//! - `batch`: Analyze every judged pair in a market set
//! - `config`: Show the validated configuration

mod analyze;
mod batch;

pub use analyze::AnalyzeArgs;
pub use batch::BatchArgs;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "poly-corr")]
#[command(about = "Correlation-to-expected-value engine for related Polymarket markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a single market pair
    Analyze(AnalyzeArgs),
    /// Analyze every judged pair in a market set
    Batch(BatchArgs),
    /// Show the validated configuration
    Config,
}

/// Result output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}
