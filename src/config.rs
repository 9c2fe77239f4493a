//! Configuration types for trade-sentinel

use crate::risk::RiskLimits;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub risk: RiskLimits,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub backtest: BacktestDefaults,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Stop monitoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Poll interval for the stop controller loop
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
        }
    }
}

/// Defaults for backtest runs; dates and symbols come from the caller
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestDefaults {
    /// Directory holding `<SYMBOL>.csv` bar files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Starting capital
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,

    /// Commission per trade, in currency
    #[serde(default = "default_commission")]
    pub commission: Decimal,

    /// Slippage per fill as a fraction of price
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,

    /// Maximum concurrent open positions
    #[serde(default = "default_max_positions")]
    pub max_positions: usize,

    /// Fraction of current equity allocated per new position
    #[serde(default = "default_position_size_pct")]
    pub position_size_pct: Decimal,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_initial_capital() -> Decimal {
    Decimal::new(100000, 0)
}
fn default_commission() -> Decimal {
    Decimal::ZERO
}
fn default_slippage() -> Decimal {
    Decimal::new(1, 3) // 0.001 = 0.1%
}
fn default_max_positions() -> usize {
    5
}
fn default_position_size_pct() -> Decimal {
    Decimal::new(2, 1) // 0.2 = 20%
}

impl Default for BacktestDefaults {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            initial_capital: default_initial_capital(),
            commission: default_commission(),
            slippage: default_slippage(),
            max_positions: default_max_positions(),
            position_size_pct: default_position_size_pct(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Default log level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_metrics_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
