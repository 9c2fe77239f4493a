//! CLI interface for trade-sentinel
//!
//! Provides subcommands for:
//! - `backtest`: Run a historical simulation over CSV bar files
//! - `config`: Show the effective configuration

mod backtest;

pub use backtest::BacktestArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "trade-sentinel")]
#[command(about = "Risk-gated trade execution and historical simulation engine")]
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
    /// Run a historical simulation
    Backtest(BacktestArgs),
    /// Show the effective configuration
    Config,
}
