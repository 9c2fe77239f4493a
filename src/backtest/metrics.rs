//! Performance metrics
//!
//! Pure functions from a trade list and equity curve to risk/return
//! statistics. Ratios are `f64` because several of them use an explicit
//! `+∞` sentinel (no losses, no drawdown); currency stays `Decimal`.

use super::{EquityPoint, TradeRecord};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Annualization factor for daily returns
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate used by Sharpe/Sortino
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Maximum drawdown statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawdownStats {
    /// Peak-to-trough decline in currency
    pub max_drawdown: Decimal,
    /// Peak-to-trough decline as a fraction of the peak (positive)
    pub max_drawdown_pct: f64,
    /// Index of the peak preceding the deepest trough
    pub peak_index: usize,
    /// Index of the deepest trough
    pub trough_index: usize,
}

/// Win/loss partition statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct WinStats {
    /// Fraction of trades closed at a profit
    pub win_rate: f64,
    /// Total closed trades
    pub total_trades: usize,
    /// Winning trades
    pub wins: usize,
    /// Losing trades
    pub losses: usize,
    /// Mean profit of winners, in currency
    pub avg_win: Decimal,
    /// Mean loss of losers, in currency (negative)
    pub avg_loss: Decimal,
    /// Mean winner return fraction
    pub avg_win_percent: f64,
    /// Mean loser return fraction
    pub avg_loss_percent: f64,
}

/// Every statistic in one bundle; the only shape other components consume
#[derive(Debug, Clone, Serialize)]
pub struct MetricsBundle {
    pub initial_capital: Decimal,
    pub final_value: Decimal,
    pub total_return: f64,
    pub annual_return: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub avg_win_percent: f64,
    pub avg_loss_percent: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: f64,
    pub calmar_ratio: f64,
    pub profit_factor: f64,
    pub expectancy: Decimal,
    pub avg_holding_days: f64,
    pub min_holding_days: i64,
    pub max_holding_days: i64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Annualized Sharpe ratio over daily returns
///
/// Zero for fewer than two samples or a zero-variance series.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(returns);
    if std == 0.0 {
        return 0.0;
    }
    (mean(returns) * TRADING_DAYS_PER_YEAR - risk_free_rate)
        / (std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized Sortino ratio: Sharpe with downside deviation only
///
/// `+∞` when there are no negative returns.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return f64::INFINITY;
    }
    let downside_std = std_dev(&downside);
    if downside_std == 0.0 {
        return 0.0;
    }
    (mean(returns) * TRADING_DAYS_PER_YEAR - risk_free_rate)
        / (downside_std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Maximum peak-to-trough decline of the equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> DrawdownStats {
    if equity_curve.len() < 2 {
        return DrawdownStats::default();
    }

    let mut running_max = equity_curve[0].value;
    let mut worst = dec!(0);
    let mut trough_index = 0;
    for (i, point) in equity_curve.iter().enumerate() {
        if point.value > running_max {
            running_max = point.value;
        }
        if running_max > dec!(0) {
            let drawdown = (point.value - running_max) / running_max;
            if drawdown < worst {
                worst = drawdown;
                trough_index = i;
            }
        }
    }

    // First occurrence of the pre-trough maximum
    let mut peak_index = 0;
    for (i, point) in equity_curve[..=trough_index].iter().enumerate() {
        if point.value > equity_curve[peak_index].value {
            peak_index = i;
        }
    }

    DrawdownStats {
        max_drawdown: equity_curve[peak_index].value - equity_curve[trough_index].value,
        max_drawdown_pct: worst.abs().to_f64().unwrap_or(0.0),
        peak_index,
        trough_index,
    }
}

/// Win rate and average win/loss over the closed-trade partition
pub fn win_stats(trades: &[TradeRecord]) -> WinStats {
    if trades.is_empty() {
        return WinStats::default();
    }

    let (wins, losses): (Vec<&TradeRecord>, Vec<&TradeRecord>) =
        trades.iter().partition(|t| t.win);

    let avg = |set: &[&TradeRecord]| -> Decimal {
        if set.is_empty() {
            dec!(0)
        } else {
            set.iter().map(|t| t.pnl).sum::<Decimal>() / Decimal::from(set.len() as u64)
        }
    };
    let avg_pct = |set: &[&TradeRecord]| -> f64 {
        if set.is_empty() {
            0.0
        } else {
            (set.iter().map(|t| t.pnl_percent).sum::<Decimal>()
                / Decimal::from(set.len() as u64))
            .to_f64()
            .unwrap_or(0.0)
        }
    };

    WinStats {
        win_rate: wins.len() as f64 / trades.len() as f64,
        total_trades: trades.len(),
        wins: wins.len(),
        losses: losses.len(),
        avg_win: avg(&wins),
        avg_loss: avg(&losses),
        avg_win_percent: avg_pct(&wins),
        avg_loss_percent: avg_pct(&losses),
    }
}

/// Gross profit over absolute gross loss
///
/// `+∞` when there are no losses but some profit; zero with no trades.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: Decimal = trades.iter().filter(|t| t.win).map(|t| t.pnl).sum();
    let gross_loss: Decimal = trades.iter().filter(|t| !t.win).map(|t| t.pnl).sum();
    let gross_loss = gross_loss.abs();

    if gross_loss == dec!(0) {
        if gross_profit > dec!(0) {
            return f64::INFINITY;
        }
        return 0.0;
    }
    (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
}

/// Annualized return over maximum drawdown
///
/// `+∞` when the curve never draws down but the return is positive.
pub fn calmar_ratio(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let first = equity_curve[0].value.to_f64().unwrap_or(0.0);
    let last = equity_curve[equity_curve.len() - 1].value.to_f64().unwrap_or(0.0);
    if first == 0.0 {
        return 0.0;
    }

    let total_return = (last - first) / first;
    let days = equity_curve.len() as f64;
    let annual_return = (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / days) - 1.0;

    let drawdown = max_drawdown(equity_curve);
    if drawdown.max_drawdown_pct == 0.0 {
        if annual_return > 0.0 {
            return f64::INFINITY;
        }
        return 0.0;
    }
    annual_return / drawdown.max_drawdown_pct
}

/// Probability-weighted average profit per trade
pub fn expectancy(trades: &[TradeRecord]) -> Decimal {
    if trades.is_empty() {
        return dec!(0);
    }
    let stats = win_stats(trades);
    let win_rate = Decimal::from_f64_retain(stats.win_rate).unwrap_or(dec!(0));
    win_rate * stats.avg_win - (dec!(1) - win_rate) * stats.avg_loss.abs()
}

/// Calculate the full statistics bundle
///
/// The single entry point other components call.
pub fn calculate_all_metrics(
    trades: &[TradeRecord],
    equity_curve: &[EquityPoint],
    returns: &[f64],
    initial_capital: Decimal,
) -> MetricsBundle {
    let win = win_stats(trades);
    let drawdown = max_drawdown(equity_curve);

    let final_value = equity_curve
        .last()
        .map(|p| p.value)
        .unwrap_or(initial_capital);
    let total_return = if initial_capital > dec!(0) {
        ((final_value - initial_capital) / initial_capital)
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };
    let days = equity_curve.len() as f64;
    let annual_return = if days > 0.0 {
        (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / days) - 1.0
    } else {
        0.0
    };

    let holding: Vec<i64> = trades.iter().map(|t| t.holding_days).collect();

    MetricsBundle {
        initial_capital,
        final_value,
        total_return,
        annual_return,
        total_trades: win.total_trades,
        wins: win.wins,
        losses: win.losses,
        win_rate: win.win_rate,
        avg_win: win.avg_win,
        avg_loss: win.avg_loss,
        avg_win_percent: win.avg_win_percent,
        avg_loss_percent: win.avg_loss_percent,
        sharpe_ratio: sharpe_ratio(returns, DEFAULT_RISK_FREE_RATE),
        sortino_ratio: sortino_ratio(returns, DEFAULT_RISK_FREE_RATE),
        max_drawdown: drawdown.max_drawdown,
        max_drawdown_pct: drawdown.max_drawdown_pct,
        calmar_ratio: calmar_ratio(equity_curve),
        profit_factor: profit_factor(trades),
        expectancy: expectancy(trades),
        avg_holding_days: if holding.is_empty() {
            0.0
        } else {
            holding.iter().sum::<i64>() as f64 / holding.len() as f64
        },
        min_holding_days: holding.iter().copied().min().unwrap_or(0),
        max_holding_days: holding.iter().copied().max().unwrap_or(0),
    }
}
