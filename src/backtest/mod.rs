//! Backtesting module
//!
//! Day-stepped historical simulation against a virtual portfolio, plus the
//! performance statistics computed from its trade log

mod analytics;
mod metrics;
mod simulator;

pub use analytics::{BacktestResult, EquityPoint, TradeRecord};
pub use metrics::{
    calculate_all_metrics, calmar_ratio, expectancy, max_drawdown, profit_factor, sharpe_ratio,
    sortino_ratio, win_stats, DrawdownStats, MetricsBundle, WinStats, DEFAULT_RISK_FREE_RATE,
};
pub use simulator::{BacktestSimulator, VirtualPosition, WalkForwardReport};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backtest errors
#[derive(Debug, Error)]
pub enum BacktestError {
    /// No historical bars for any symbol in the universe
    #[error("no historical data available for the requested universe")]
    NoData,
}

/// Backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// First simulated date
    pub start_date: NaiveDate,
    /// Last simulated date
    pub end_date: NaiveDate,
    /// Starting cash
    pub initial_capital: Decimal,
    /// Symbol universe
    pub symbols: Vec<String>,
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

fn default_commission() -> Decimal {
    dec!(0)
}
fn default_slippage() -> Decimal {
    dec!(0.001)
}
fn default_max_positions() -> usize {
    5
}
fn default_position_size_pct() -> Decimal {
    dec!(0.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_toml() {
        let toml = r#"
            start_date = "2024-01-01"
            end_date = "2024-06-30"
            initial_capital = 100000
            symbols = ["AAPL", "MSFT"]
        "#;
        let config: BacktestConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.commission, dec!(0));
        assert_eq!(config.slippage, dec!(0.001));
        assert_eq!(config.max_positions, 5);
        assert_eq!(config.position_size_pct, dec!(0.2));
    }
}
