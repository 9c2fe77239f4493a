//! Stop controller and poll loop

use super::{ExitConfig, StopKind, StopState};
use crate::broker::{Broker, BrokerError, OrderSide, OrderType, Position};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// What fired an automatic exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

/// An automatic exit, published for persistence/alerting collaborators
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExitEvent {
    /// Symbol that was exited
    pub symbol: String,
    /// Which condition fired
    pub reason: ExitReason,
    /// Quantity closed
    pub quantity: Decimal,
    /// Price at trigger time
    pub price: Decimal,
    /// Broker order id of the exit order
    pub order_id: Uuid,
    /// Trigger timestamp
    pub timestamp: DateTime<Utc>,
}

type ConfigMap = Arc<RwLock<HashMap<String, ExitConfig>>>;

/// Tracks exit conditions per symbol and polls the broker for triggers
///
/// API handlers may mutate the config table at any time while the poll task
/// is iterating; every tick works from a point-in-time snapshot of the key
/// set and re-checks presence before acting, so a concurrent removal is
/// harmless and a trigger removes its config exactly once.
pub struct StopController {
    broker: Arc<dyn Broker>,
    configs: ConfigMap,
    poll_interval: Duration,
    events_tx: Option<mpsc::UnboundedSender<ExitEvent>>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl StopController {
    /// Create a controller polling at the given interval
    pub fn new(broker: Arc<dyn Broker>, poll_interval: Duration) -> Self {
        Self {
            broker,
            configs: Arc::new(RwLock::new(HashMap::new())),
            poll_interval,
            events_tx: None,
            shutdown: None,
            task: None,
        }
    }

    /// Controller with the default 1s poll interval
    pub fn with_default_interval(broker: Arc<dyn Broker>) -> Self {
        Self::new(broker, Duration::from_secs(1))
    }

    /// Hand out the exit-event stream
    ///
    /// Events from triggers fired before the first call are dropped.
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<ExitEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events_tx = Some(tx);
        rx
    }

    /// Set or replace the stop-loss config for a symbol
    ///
    /// Replacing resets trailing bookkeeping and drops any take-profit set
    /// on the previous config.
    pub async fn set_stop(
        &self,
        symbol: &str,
        kind: StopKind,
        stop_price: Option<Decimal>,
        stop_percentage: Option<Decimal>,
        trailing_percentage: Option<Decimal>,
        entry_price: Option<Decimal>,
    ) {
        let mut config = ExitConfig::new(symbol, kind);
        config.stop_price = stop_price;
        config.stop_percentage = stop_percentage;
        config.trailing_percentage = trailing_percentage;
        config.entry_price = entry_price;

        self.configs.write().await.insert(symbol.to_string(), config);
        tracing::info!(symbol, ?kind, "stop-loss set");
    }

    /// Attach or overwrite take-profit thresholds for a symbol
    ///
    /// Creates a default fixed-stop config when none exists.
    pub async fn set_take_profit(
        &self,
        symbol: &str,
        take_profit_price: Option<Decimal>,
        take_profit_percentage: Option<Decimal>,
    ) {
        let mut map = self.configs.write().await;
        let config = map
            .entry(symbol.to_string())
            .or_insert_with(|| ExitConfig::new(symbol, StopKind::Fixed));
        config.take_profit_price = take_profit_price;
        config.take_profit_percentage = take_profit_percentage;
        tracing::info!(symbol, "take-profit set");
    }

    /// Remove the config for a symbol; no-op if absent
    pub async fn remove(&self, symbol: &str) {
        if self.configs.write().await.remove(symbol).is_some() {
            tracing::info!(symbol, "stop config removed");
        }
    }

    /// Snapshot of one symbol's config
    pub async fn get_stop(&self, symbol: &str) -> Option<ExitConfig> {
        self.configs.read().await.get(symbol).cloned()
    }

    /// Snapshot of the full config table
    pub async fn all_stops(&self) -> HashMap<String, ExitConfig> {
        self.configs.read().await.clone()
    }

    /// Start the background poll loop; no-op if already running
    pub fn start(&mut self) {
        if self.task.is_some() {
            tracing::warn!("stop monitoring already running");
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        self.shutdown = Some(tx);

        let broker = self.broker.clone();
        let configs = self.configs.clone();
        let events = self.events_tx.clone();
        let interval = self.poll_interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = Self::check_positions(&broker, &configs, &events).await {
                            crate::telemetry::record_tick_error();
                            tracing::error!(error = %e, "stop poll tick failed");
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
            tracing::info!("stop monitoring loop exited");
        }));
        tracing::info!(interval_ms = interval.as_millis() as u64, "stop monitoring started");
    }

    /// Stop the poll loop and wait for the task to finish
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(true);
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        tracing::info!("stop monitoring stopped");
    }

    /// Run a single poll tick
    pub async fn poll_once(&self) -> Result<(), BrokerError> {
        Self::check_positions(&self.broker, &self.configs, &self.events_tx).await
    }

    async fn check_positions(
        broker: &Arc<dyn Broker>,
        configs: &ConfigMap,
        events: &Option<mpsc::UnboundedSender<ExitEvent>>,
    ) -> Result<(), BrokerError> {
        let positions = broker.get_positions().await?;

        for position in positions {
            if let Err(e) = Self::check_symbol(broker, configs, events, &position).await {
                // One symbol's failure must not starve the rest of the tick;
                // it is retried on the next one.
                tracing::error!(symbol = %position.symbol, error = %e, "stop check failed");
            }
        }

        crate::telemetry::record_active_stops(configs.read().await.len());
        Ok(())
    }

    async fn check_symbol(
        broker: &Arc<dyn Broker>,
        configs: &ConfigMap,
        events: &Option<mpsc::UnboundedSender<ExitEvent>>,
        position: &Position,
    ) -> Result<(), BrokerError> {
        let symbol = position.symbol.as_str();

        // Skip symbols nobody is monitoring before touching market data
        if !configs.read().await.contains_key(symbol) {
            return Ok(());
        }
        let current_price = broker.get_market_price(symbol).await?;

        // Decide under the write lock, then submit without holding it
        let triggered = {
            let mut map = configs.write().await;
            let Some(config) = map.get_mut(symbol) else {
                return Ok(());
            };
            if config.state != StopState::Active {
                return Ok(());
            }

            if config.entry_price.is_none() {
                config.entry_price = Some(position.entry_price);
            }
            if config.kind == StopKind::Trailing {
                config.update_trailing(current_price, position.side);
            }

            // Stop-loss wins the tick; take-profit is only consulted if the
            // stop did not fire.
            let reason = if config.should_trigger_stop(current_price, position.side) {
                Some(ExitReason::StopLoss)
            } else if config.should_trigger_take_profit(current_price, position.side) {
                Some(ExitReason::TakeProfit)
            } else {
                None
            };

            if reason.is_some() {
                config.state = StopState::Triggered;
            }
            reason
        };

        let Some(reason) = triggered else {
            return Ok(());
        };

        match reason {
            ExitReason::StopLoss => {
                tracing::warn!(symbol, %current_price, "stop-loss triggered")
            }
            ExitReason::TakeProfit => {
                tracing::info!(symbol, %current_price, "take-profit triggered")
            }
        }

        let exit_side = OrderSide::closing(position.side);
        match broker
            .place_order(symbol, position.quantity, exit_side, OrderType::Market, None)
            .await
        {
            Ok(order) => {
                configs.write().await.remove(symbol);
                crate::telemetry::record_exit_triggered();
                tracing::info!(symbol, order_id = %order.order_id, ?reason, "exit order submitted");

                if let Some(tx) = events {
                    let _ = tx.send(ExitEvent {
                        symbol: symbol.to_string(),
                        reason,
                        quantity: position.quantity,
                        price: current_price,
                        order_id: order.order_id,
                        timestamp: Utc::now(),
                    });
                }
                Ok(())
            }
            Err(e) => {
                // Keep the config so the next tick retries the trigger
                if let Some(config) = configs.write().await.get_mut(symbol) {
                    config.state = StopState::Active;
                }
                tracing::error!(symbol, error = %e, "exit order submission failed, will retry");
                Err(e)
            }
        }
    }
}
