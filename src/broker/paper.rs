//! In-memory paper broker
//!
//! Simulated broker used by tests and offline runs: scripted prices, seeded
//! historical bars, immediate fills, and a failure switch for exercising
//! order-retry paths.

use super::{
    AccountSnapshot, Bar, Broker, BrokerError, MarketData, OrderResult, OrderSide, OrderStatus,
    OrderType, Position, Timeframe,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

struct Inner {
    account: AccountSnapshot,
    positions: HashMap<String, Position>,
    prices: HashMap<String, Decimal>,
    bars: HashMap<String, Vec<Bar>>,
    orders: Vec<OrderResult>,
    fail_orders: bool,
}

/// Paper broker with simulated fills
pub struct PaperBroker {
    inner: Arc<RwLock<Inner>>,
}

impl PaperBroker {
    /// Create a new paper broker with a default flat account
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                account: AccountSnapshot {
                    cash: dec!(100000),
                    equity: dec!(100000),
                    buying_power: dec!(200000),
                    unrealized_pnl: dec!(0),
                    realized_pnl: dec!(0),
                },
                positions: HashMap::new(),
                prices: HashMap::new(),
                bars: HashMap::new(),
                orders: vec![],
                fail_orders: false,
            })),
        }
    }

    /// Replace the account snapshot
    pub async fn set_account(&self, account: AccountSnapshot) {
        self.inner.write().await.account = account;
    }

    /// Upsert an open position
    pub async fn set_position(&self, position: Position) {
        let mut inner = self.inner.write().await;
        inner
            .prices
            .insert(position.symbol.clone(), position.current_price);
        inner.positions.insert(position.symbol.clone(), position);
    }

    /// Update the market price for a symbol, marking any open position
    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        let mut inner = self.inner.write().await;
        inner.prices.insert(symbol.to_string(), price);
        if let Some(position) = inner.positions.get_mut(symbol) {
            position.current_price = price;
        }
    }

    /// Drop the market price for a symbol, simulating a feed outage
    pub async fn clear_price(&self, symbol: &str) {
        self.inner.write().await.prices.remove(symbol);
    }

    /// Seed historical bars for a symbol
    pub async fn seed_bars(&self, symbol: &str, bars: Vec<Bar>) {
        self.inner.write().await.bars.insert(symbol.to_string(), bars);
    }

    /// Make subsequent order submissions fail
    pub async fn fail_orders(&self, fail: bool) {
        self.inner.write().await.fail_orders = fail;
    }

    /// All orders submitted so far
    pub async fn orders(&self) -> Vec<OrderResult> {
        self.inner.read().await.orders.clone()
    }
}

impl Default for PaperBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketData for PaperBroker {
    async fn get_market_price(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        let inner = self.inner.read().await;
        inner
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerError::PriceUnavailable(symbol.to_string()))
    }

    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _timeframe: Timeframe,
    ) -> Result<Vec<Bar>, BrokerError> {
        let inner = self.inner.read().await;
        let bars = inner
            .bars
            .get(symbol)
            .ok_or_else(|| BrokerError::Api(format!("no bars seeded for {symbol}")))?;
        Ok(bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn get_account(&self) -> Result<AccountSnapshot, BrokerError> {
        Ok(self.inner.read().await.account.clone())
    }

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
        Ok(self.inner.read().await.positions.values().cloned().collect())
    }

    async fn get_position(&self, symbol: &str) -> Result<Option<Position>, BrokerError> {
        Ok(self.inner.read().await.positions.get(symbol).cloned())
    }

    async fn place_order(
        &self,
        symbol: &str,
        quantity: Decimal,
        side: OrderSide,
        _order_type: OrderType,
        _limit_price: Option<Decimal>,
    ) -> Result<OrderResult, BrokerError> {
        let mut inner = self.inner.write().await;
        if inner.fail_orders {
            return Err(BrokerError::OrderRejected("paper broker in fail mode".into()));
        }

        let order = OrderResult {
            order_id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            quantity,
            side,
            status: OrderStatus::Filled,
            submitted_at: Utc::now(),
        };
        inner.orders.push(order.clone());

        // A fill on the closing side reduces the tracked position
        let closed_out = match inner.positions.get_mut(symbol) {
            Some(position) if OrderSide::closing(position.side) == side => {
                position.quantity -= quantity;
                position.quantity <= dec!(0)
            }
            _ => false,
        };
        if closed_out {
            inner.positions.remove(symbol);
        }

        tracing::info!(order_id = %order.order_id, symbol, "paper order filled");
        Ok(order)
    }

    async fn cancel_order(&self, order_id: Uuid) -> Result<(), BrokerError> {
        tracing::info!(%order_id, "paper order cancelled");
        Ok(())
    }
}
