//! Backtest command implementation

use crate::backtest::{BacktestConfig, BacktestSimulator};
use crate::config::Config;
use crate::data::CsvStore;
use crate::signal::SmaCrossover;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Symbols to simulate (comma separated)
    #[arg(short, long, required = true, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// First simulated date (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last simulated date (YYYY-MM-DD)
    #[arg(long)]
    pub end: NaiveDate,

    /// Bar file directory, overriding the configured one
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Short SMA window in days
    #[arg(long, default_value_t = 20)]
    pub short_window: usize,

    /// Long SMA window in days
    #[arg(long, default_value_t = 50)]
    pub long_window: usize,

    /// Run walk-forward analysis with this window size in days
    #[arg(long)]
    pub walk_forward: Option<u64>,

    /// Step between walk-forward windows in days
    #[arg(long, default_value_t = 30)]
    pub step_days: u64,

    /// Write the full JSON report to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl BacktestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let data_dir = self
            .data_dir
            .clone()
            .unwrap_or_else(|| config.backtest.data_dir.clone());
        let store = CsvStore::load(&data_dir, &self.symbols);
        let source = SmaCrossover::new(self.short_window, self.long_window);

        let backtest_config = BacktestConfig {
            start_date: self.start,
            end_date: self.end,
            initial_capital: config.backtest.initial_capital,
            symbols: self.symbols.clone(),
            commission: config.backtest.commission,
            slippage: config.backtest.slippage,
            max_positions: config.backtest.max_positions,
            position_size_pct: config.backtest.position_size_pct,
        };

        let mut simulator = BacktestSimulator::new();

        if let Some(window_days) = self.walk_forward {
            let report = simulator
                .walk_forward(&source, &store, &backtest_config, window_days, self.step_days)
                .await?;

            for (i, window) in report.windows.iter().enumerate() {
                println!(
                    "window {:>2}: {} .. {}  return {:+.2}%  sharpe {:.2}  trades {}",
                    i + 1,
                    window.config.start_date,
                    window.config.end_date,
                    window.metrics.total_return * 100.0,
                    window.metrics.sharpe_ratio,
                    window.metrics.total_trades,
                );
            }
            println!(
                "\n{} windows  avg return {:+.2}%  avg sharpe {:.2}  avg win rate {:.1}%  avg max drawdown {:.2}%",
                report.windows.len(),
                report.avg_total_return * 100.0,
                report.avg_sharpe_ratio,
                report.avg_win_rate * 100.0,
                report.avg_max_drawdown_pct * 100.0,
            );

            if let Some(path) = &self.output {
                std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
                tracing::info!(path = %path.display(), "wrote walk-forward report");
            }
        } else {
            let result = simulator.run(&source, &store, &backtest_config).await?;
            println!("{}", result.format_table());

            if let Some(path) = &self.output {
                std::fs::write(path, serde_json::to_string_pretty(&result)?)?;
                tracing::info!(path = %path.display(), "wrote backtest report");
            }
        }

        Ok(())
    }
}
