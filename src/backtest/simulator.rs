//! Backtest simulator engine

use super::{
    calculate_all_metrics, BacktestConfig, BacktestError, BacktestResult, EquityPoint, TradeRecord,
};
use crate::broker::{Bar, MarketData, Timeframe};
use crate::signal::{Signal, SignalSource};
use chrono::{Days, NaiveDate};
use futures_util::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// An open position in the virtual ledger
///
/// Owned by the simulator for the duration of one run; destroyed on close.
#[derive(Debug, Clone)]
pub struct VirtualPosition {
    /// Symbol
    pub symbol: String,
    /// Date the position was opened
    pub entry_date: NaiveDate,
    /// Entry fill price (slippage applied)
    pub entry_price: Decimal,
    /// Shares held
    pub shares: u64,
    /// Total acquisition cost including commission
    pub cost_basis: Decimal,
}

impl VirtualPosition {
    /// Mark-to-market value at a price
    pub fn current_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.shares) * price
    }
}

/// Aggregated walk-forward analysis results
#[derive(Debug, Serialize)]
pub struct WalkForwardReport {
    /// Per-window results in chronological order
    pub windows: Vec<BacktestResult>,
    /// Mean total return across windows
    pub avg_total_return: f64,
    /// Mean Sharpe ratio across windows
    pub avg_sharpe_ratio: f64,
    /// Mean win rate across windows
    pub avg_win_rate: f64,
    /// Mean max drawdown fraction across windows
    pub avg_max_drawdown_pct: f64,
}

/// Day-stepped simulation against a virtual portfolio
///
/// Single-threaded and deterministic given its inputs; state is reset at the
/// start of every run.
pub struct BacktestSimulator {
    positions: HashMap<String, VirtualPosition>,
    closed_trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    cash: Decimal,
}

impl BacktestSimulator {
    /// Create a simulator
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            closed_trades: vec![],
            equity_curve: vec![],
            cash: dec!(0),
        }
    }

    /// Run the simulation
    pub async fn run(
        &mut self,
        source: &dyn SignalSource,
        data: &dyn MarketData,
        config: &BacktestConfig,
    ) -> Result<BacktestResult, BacktestError> {
        tracing::info!(
            start = %config.start_date,
            end = %config.end_date,
            symbols = config.symbols.len(),
            capital = %config.initial_capital,
            "starting backtest"
        );

        let historical = Self::fetch_historical(data, config).await;
        if historical.is_empty() {
            return Err(BacktestError::NoData);
        }

        self.cash = config.initial_capital;
        self.positions.clear();
        self.closed_trades.clear();
        self.equity_curve = vec![EquityPoint {
            date: config.start_date,
            value: config.initial_capital,
        }];

        // Union of trading dates across the universe, ascending. Later days
        // depend on cash/positions from earlier ones, so this loop must stay
        // strictly sequential.
        let all_dates: BTreeSet<NaiveDate> = historical
            .values()
            .flat_map(|bars| bars.iter().map(|b| b.date))
            .collect();
        tracing::info!(days = all_dates.len(), "simulating trading days");

        let mut last_close: HashMap<String, Decimal> = HashMap::new();

        for current_date in &all_dates {
            for (symbol, bars) in &historical {
                if let Ok(idx) = bars.binary_search_by_key(current_date, |b| b.date) {
                    last_close.insert(symbol.clone(), bars[idx].close);
                }
            }

            let portfolio_value = self.portfolio_value(&last_close);
            self.equity_curve.push(EquityPoint {
                date: *current_date,
                value: portfolio_value,
            });

            // Universe order keeps signal processing deterministic
            for symbol in &config.symbols {
                let Some(bars) = historical.get(symbol) else {
                    continue;
                };
                let end = bars.partition_point(|b| b.date <= *current_date);
                let history = &bars[..end];
                if history.len() < source.required_history() {
                    continue;
                }
                // Only act on symbols that traded today
                let Some(today) = history.last().filter(|b| b.date == *current_date) else {
                    continue;
                };
                let close = today.close;

                match source.signal(symbol, history).signal {
                    Signal::Buy => self.open_position(symbol, close, *current_date, config),
                    Signal::Sell => self.close_position(symbol, close, *current_date, config),
                    Signal::Hold => {}
                }
            }
        }

        // Force-close whatever is still open at the last available price.
        // Commission applies here exactly as on a signal-driven close.
        if let Some(final_date) = all_dates.iter().next_back().copied() {
            let mut remaining: Vec<String> = self.positions.keys().cloned().collect();
            remaining.sort();
            for symbol in remaining {
                if let Some(close) = last_close.get(&symbol).copied() {
                    self.close_position(&symbol, close, final_date, config);
                }
            }
        }

        let daily_returns = Self::daily_returns(&self.equity_curve);
        let metrics = calculate_all_metrics(
            &self.closed_trades,
            &self.equity_curve,
            &daily_returns,
            config.initial_capital,
        );

        tracing::info!(
            trades = self.closed_trades.len(),
            final_value = %metrics.final_value,
            sharpe = metrics.sharpe_ratio,
            "backtest complete"
        );

        Ok(BacktestResult {
            config: config.clone(),
            strategy_name: source.name().to_string(),
            trades: std::mem::take(&mut self.closed_trades),
            equity_curve: std::mem::take(&mut self.equity_curve),
            daily_returns,
            metrics,
        })
    }

    /// Run the simulation over successive windows to detect overfitting
    ///
    /// Each window spans `window_days`, advancing by `step_days`, until the
    /// window would pass the configured end date.
    pub async fn walk_forward(
        &mut self,
        source: &dyn SignalSource,
        data: &dyn MarketData,
        config: &BacktestConfig,
        window_days: u64,
        step_days: u64,
    ) -> Result<WalkForwardReport, BacktestError> {
        tracing::info!(window_days, step_days, "starting walk-forward analysis");

        let mut windows = vec![];
        let mut current_start = config.start_date;

        while current_start + Days::new(window_days) <= config.end_date {
            let window_config = BacktestConfig {
                start_date: current_start,
                end_date: current_start + Days::new(window_days),
                ..config.clone()
            };
            windows.push(self.run(source, data, &window_config).await?);
            current_start = current_start + Days::new(step_days);
        }

        tracing::info!(windows = windows.len(), "walk-forward complete");

        let count = windows.len() as f64;
        let avg = |f: fn(&BacktestResult) -> f64| -> f64 {
            if windows.is_empty() {
                0.0
            } else {
                windows.iter().map(f).sum::<f64>() / count
            }
        };

        Ok(WalkForwardReport {
            avg_total_return: avg(|w| w.metrics.total_return),
            avg_sharpe_ratio: avg(|w| w.metrics.sharpe_ratio),
            avg_win_rate: avg(|w| w.metrics.win_rate),
            avg_max_drawdown_pct: avg(|w| w.metrics.max_drawdown_pct),
            windows,
        })
    }

    async fn fetch_historical(
        data: &dyn MarketData,
        config: &BacktestConfig,
    ) -> HashMap<String, Vec<Bar>> {
        // Fetches are independent and run concurrently; per-symbol failures
        // only shrink the universe.
        let fetches = config.symbols.iter().map(|symbol| async move {
            let bars = data
                .get_historical_bars(symbol, config.start_date, config.end_date, Timeframe::Day)
                .await;
            (symbol.clone(), bars)
        });

        let mut historical = HashMap::new();
        for (symbol, result) in join_all(fetches).await {
            match result {
                Ok(bars) if !bars.is_empty() => {
                    tracing::info!(symbol = %symbol, bars = bars.len(), "loaded history");
                    historical.insert(symbol, bars);
                }
                Ok(_) => tracing::warn!(symbol = %symbol, "no bars in range"),
                Err(e) => tracing::warn!(symbol = %symbol, error = %e, "failed to load history"),
            }
        }
        historical
    }

    fn portfolio_value(&self, last_close: &HashMap<String, Decimal>) -> Decimal {
        let positions_value: Decimal = self
            .positions
            .values()
            .map(|p| {
                let price = last_close.get(&p.symbol).copied().unwrap_or(p.entry_price);
                p.current_value(price)
            })
            .sum();
        self.cash + positions_value
    }

    fn open_position(
        &mut self,
        symbol: &str,
        close: Decimal,
        date: NaiveDate,
        config: &BacktestConfig,
    ) {
        if self.positions.contains_key(symbol) || self.positions.len() >= config.max_positions {
            return;
        }

        let current_equity = self
            .equity_curve
            .last()
            .map(|p| p.value)
            .unwrap_or(config.initial_capital);
        let position_value = current_equity * config.position_size_pct;
        let entry_price = close * (dec!(1) + config.slippage);
        if entry_price <= dec!(0) {
            return;
        }

        let shares = (position_value / entry_price).floor().to_u64().unwrap_or(0);
        if shares == 0 {
            return;
        }

        let cost = Decimal::from(shares) * entry_price + config.commission;
        if cost > self.cash {
            return;
        }

        self.positions.insert(
            symbol.to_string(),
            VirtualPosition {
                symbol: symbol.to_string(),
                entry_date: date,
                entry_price,
                shares,
                cost_basis: cost,
            },
        );
        self.cash -= cost;
        tracing::debug!(symbol, shares, price = %entry_price, "opened position");
    }

    fn close_position(
        &mut self,
        symbol: &str,
        close: Decimal,
        date: NaiveDate,
        config: &BacktestConfig,
    ) {
        let Some(position) = self.positions.remove(symbol) else {
            return;
        };

        let exit_price = close * (dec!(1) - config.slippage);
        let proceeds = Decimal::from(position.shares) * exit_price - config.commission;
        let pnl = proceeds - position.cost_basis;
        let pnl_percent = if position.cost_basis > dec!(0) {
            pnl / position.cost_basis
        } else {
            dec!(0)
        };

        self.closed_trades.push(TradeRecord {
            symbol: symbol.to_string(),
            entry_date: position.entry_date,
            exit_date: date,
            entry_price: position.entry_price,
            exit_price,
            shares: position.shares,
            pnl,
            pnl_percent,
            holding_days: (date - position.entry_date).num_days(),
            win: pnl > dec!(0),
        });
        self.cash += proceeds;
        tracing::debug!(symbol, pnl = %pnl, "closed position");
    }

    fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
        equity_curve
            .windows(2)
            .filter_map(|pair| {
                let prev = pair[0].value.to_f64()?;
                let current = pair[1].value.to_f64()?;
                if prev == 0.0 {
                    None
                } else {
                    Some((current - prev) / prev)
                }
            })
            .collect()
    }
}

impl Default for BacktestSimulator {
    fn default() -> Self {
        Self::new()
    }
}
