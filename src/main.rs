use clap::Parser;
use poly_corr::cli::{Cli, Commands};
use poly_corr::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Fall back to defaults only when the file is missing; a present but
    // invalid file is an error
    let config = if std::path::Path::new(&cli.config).exists() {
        Config::load(&cli.config)?
    } else {
        eprintln!("Warning: {} not found, using default configuration", cli.config);
        let config: Config = toml::from_str(include_str!("../config.toml.example"))?;
        config.validate()?;
        config
    };

    poly_corr::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Analyze(args) => {
            args.execute(&config).await?;
        }
        Commands::Batch(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Model: tolerance={}, proxy_volatility={}",
                config.model.tolerance, config.model.proxy_volatility
            );
            println!(
                "  Ranking: correlation_weight={}, ev_weight={}, ev_scale={}",
                config.ranking.correlation_weight, config.ranking.ev_weight, config.ranking.ev_scale
            );
            println!(
                "  Risk: pressure low<{} high>{}, loss low<={} high>{}",
                config.risk.low_pressure,
                config.risk.high_pressure,
                config.risk.low_loss_fraction,
                config.risk.high_loss_fraction
            );
            println!(
                "  Pressure: require_matching_methods={}",
                config.pressure.require_matching_methods
            );
            println!("  Batch: max_concurrency={}", config.batch.max_concurrency);
            println!(
                "  Telemetry: level={}, format={:?}, metrics_port={:?}",
                config.telemetry.log_level, config.telemetry.log_format, config.telemetry.metrics_port
            );
        }
    }

    Ok(())
}
