//! Signal source module
//!
//! Pluggable directional signals consumed by the simulator and live wiring.
//! A source only ever sees history up to the simulation's current date.

mod sma;

pub use sma::SmaCrossover;

use crate::broker::Bar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Directional trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// A signal with its context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Symbol the signal applies to
    pub symbol: String,
    /// Direction
    pub signal: Signal,
    /// Signal strength in [0, 1]
    pub strength: Decimal,
    /// Price at signal time (last close)
    pub price: Decimal,
    /// Human-readable cause
    pub reason: String,
}

impl TradeSignal {
    /// A hold signal with zero strength
    pub fn hold(symbol: &str, price: Decimal, reason: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            signal: Signal::Hold,
            strength: Decimal::ZERO,
            price,
            reason: reason.to_string(),
        }
    }
}

/// Trait for signal source implementations
///
/// Implementations must be pure over the supplied history slice; the caller
/// guarantees the slice never extends past the current simulation date.
pub trait SignalSource: Send + Sync {
    /// Produce a signal for a symbol from its bar history
    fn signal(&self, symbol: &str, history: &[Bar]) -> TradeSignal;

    /// Minimum number of bars required before a non-hold signal is possible
    fn required_history(&self) -> usize;

    /// Source name, used in reports
    fn name(&self) -> &str;
}
