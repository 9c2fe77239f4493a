use clap::Parser;
use trade_sentinel::cli::{Cli, Commands};
use trade_sentinel::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    trade_sentinel::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Risk: fraction={}, max_value={}, max_daily_loss={}, max_open={}",
                config.risk.risk_fraction_per_trade,
                config.risk.max_position_value,
                config.risk.max_daily_loss,
                config.risk.max_open_positions,
            );
            println!("  Monitor: poll every {}ms", config.monitor.poll_interval_ms);
            println!(
                "  Backtest: capital={}, commission={}, slippage={}, data_dir={}",
                config.backtest.initial_capital,
                config.backtest.commission,
                config.backtest.slippage,
                config.backtest.data_dir.display(),
            );
            println!(
                "  Telemetry: metrics_port={}, log_level={}",
                config.telemetry.metrics_port, config.telemetry.log_level,
            );
        }
    }

    Ok(())
}
