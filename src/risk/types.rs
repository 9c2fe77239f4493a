//! Risk management types

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Risk management errors
#[derive(Debug, Error)]
pub enum RiskError {
    /// Limit configuration rejected at gate construction
    #[error("invalid risk limits: {0}")]
    InvalidLimits(String),
}

/// Why a trade-admission check rejected
///
/// A rejection is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RejectReason {
    /// The daily-loss circuit breaker is active
    TradingHalted,
    /// Open position count is at the configured maximum
    MaxPositionsReached(usize),
    /// Combined daily PnL breached the loss limit
    DailyLossLimitReached(Decimal),
    /// No buying power available
    NoBuyingPower,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::TradingHalted => write!(f, "trading halted (risk limit reached)"),
            RejectReason::MaxPositionsReached(max) => {
                write!(f, "max open positions reached ({max})")
            }
            RejectReason::DailyLossLimitReached(pnl) => {
                write!(f, "daily loss limit reached: {pnl:.2}")
            }
            RejectReason::NoBuyingPower => write!(f, "no buying power available"),
        }
    }
}

/// Outcome of a trade-admission check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Admission {
    /// The position may be opened
    Allowed,
    /// The position must not be opened
    Rejected(RejectReason),
}

impl Admission {
    /// Whether the check passed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed)
    }
}
