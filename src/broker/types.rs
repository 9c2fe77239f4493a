//! Broker data types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point-in-time account state
///
/// Refreshed by the caller before each admission check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Available cash
    pub cash: Decimal,
    /// Total account equity
    pub equity: Decimal,
    /// Buying power (cash plus margin)
    pub buying_power: Decimal,
    /// Unrealized profit/loss across open positions
    pub unrealized_pnl: Decimal,
    /// Realized profit/loss for the session
    pub realized_pnl: Decimal,
}

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

/// An open position as reported by the broker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Position quantity (always positive; direction is `side`)
    pub quantity: Decimal,
    /// Average entry price
    pub entry_price: Decimal,
    /// Last known market price
    pub current_price: Decimal,
    /// Unrealized profit/loss
    pub unrealized_pnl: Decimal,
    /// Position direction
    pub side: PositionSide,
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The side that closes a position in the given direction
    pub fn closing(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order (immediate execution)
    Market,
    /// Limit order (price specified)
    Limit,
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
}

/// Result of an order submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    /// Broker-assigned order identifier
    pub order_id: Uuid,
    /// Symbol
    pub symbol: String,
    /// Order quantity
    pub quantity: Decimal,
    /// Order side
    pub side: OrderSide,
    /// Current status
    pub status: OrderStatus,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

/// A single historical bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub close: Decimal,
    /// Traded volume
    pub volume: Decimal,
}

/// Bar aggregation interval
///
/// Only daily bars are consumed by the simulator; this is the extension
/// point for intraday adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeframe::Day => write!(f, "1Day"),
        }
    }
}
