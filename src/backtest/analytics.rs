//! Backtest outputs and reporting

use super::{BacktestConfig, MetricsBundle};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A closed trade, live or simulated
///
/// Append-only: one record per position close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Symbol traded
    pub symbol: String,
    /// Entry date
    pub entry_date: NaiveDate,
    /// Exit date
    pub exit_date: NaiveDate,
    /// Entry fill price (slippage applied)
    pub entry_price: Decimal,
    /// Exit fill price (slippage applied)
    pub exit_price: Decimal,
    /// Shares traded
    pub shares: u64,
    /// Net profit/loss including commissions
    pub pnl: Decimal,
    /// Profit/loss as a fraction of cost basis
    pub pnl_percent: Decimal,
    /// Whole days between entry and exit
    pub holding_days: i64,
    /// Whether the trade closed at a profit
    pub win: bool,
}

/// One equity curve sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityPoint {
    /// Simulated date
    pub date: NaiveDate,
    /// Portfolio value (cash plus marked positions)
    pub value: Decimal,
}

/// Complete results from one backtest run
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    /// Configuration the run used
    pub config: BacktestConfig,
    /// Signal source name
    pub strategy_name: String,
    /// Closed trades in close order
    pub trades: Vec<TradeRecord>,
    /// Portfolio value per simulated day, including the start point
    pub equity_curve: Vec<EquityPoint>,
    /// Day-over-day returns derived from the equity curve
    pub daily_returns: Vec<f64>,
    /// Full statistics bundle
    pub metrics: MetricsBundle,
}

impl BacktestResult {
    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        let m = &self.metrics;
        format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS — {}
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Initial Capital:  {:.2}
Final Value:      {:.2}
Total Return:     {:+.2}%
Annual Return:    {:+.2}%
Sharpe Ratio:     {:.2}
Sortino Ratio:    {:.2}
Calmar Ratio:     {:.2}
Max Drawdown:     {:.2} ({:.2}%)

TRADES
───────────────────────────────────────────────────────
Total Trades:     {} ({} wins / {} losses)
Win Rate:         {:.1}%
Avg Win:          {:.2}
Avg Loss:         {:.2}
Profit Factor:    {:.2}
Expectancy:       {:.2}
Holding Days:     min {} / avg {:.1} / max {}
══════════════════════════════════════════════════════
"#,
            self.strategy_name,
            m.initial_capital,
            m.final_value,
            m.total_return * 100.0,
            m.annual_return * 100.0,
            m.sharpe_ratio,
            m.sortino_ratio,
            m.calmar_ratio,
            m.max_drawdown,
            m.max_drawdown_pct * 100.0,
            m.total_trades,
            m.wins,
            m.losses,
            m.win_rate * 100.0,
            m.avg_win,
            m.avg_loss,
            m.profit_factor,
            m.expectancy,
            m.min_holding_days,
            m.avg_holding_days,
            m.max_holding_days,
        )
    }
}
