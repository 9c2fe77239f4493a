//! Broker adapter module
//!
//! Contract for market data and order execution. The core never talks to a
//! concrete broker SDK; live wiring supplies an implementation of these
//! traits.

mod paper;
mod types;

pub use paper::PaperBroker;
pub use types::{
    AccountSnapshot, Bar, OrderResult, OrderSide, OrderStatus, OrderType, Position, PositionSide,
    Timeframe,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by broker adapters
///
/// Every variant is treated uniformly as retryable/loggable by the core.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Upstream API failure
    #[error("broker API error: {0}")]
    Api(String),
    /// No current price available for a symbol
    #[error("no price available for {0}")]
    PriceUnavailable(String),
    /// No open position for a symbol
    #[error("no position for {0}")]
    NoSuchPosition(String),
    /// Order was rejected by the broker
    #[error("order rejected: {0}")]
    OrderRejected(String),
}

/// Trait for market data access
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Get the current market price for a symbol
    async fn get_market_price(&self, symbol: &str) -> Result<Decimal, BrokerError>;

    /// Get historical bars for a symbol, ordered by date ascending
    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>, BrokerError>;
}

/// Trait for full broker implementations: market data plus account state and
/// order submission
#[async_trait]
pub trait Broker: MarketData {
    /// Get a snapshot of the trading account
    async fn get_account(&self) -> Result<AccountSnapshot, BrokerError>;

    /// Get all open positions
    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError>;

    /// Get a single open position
    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError>;

    /// Place an order
    async fn place_order(
        &self,
        symbol: &str,
        quantity: Decimal,
        side: OrderSide,
        order_type: OrderType,
        limit_price: Option<Decimal>,
    ) -> Result<OrderResult, BrokerError>;

    /// Cancel an open order
    async fn cancel_order(&self, order_id: uuid::Uuid) -> Result<(), BrokerError>;
}
