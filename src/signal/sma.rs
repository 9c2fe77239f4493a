//! Simple moving average crossover source

use super::{Signal, SignalSource, TradeSignal};
use crate::broker::Bar;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// SMA crossover signal source
///
/// Buys when the short SMA crosses above the long SMA (golden cross) and
/// sells on the opposite crossing (death cross). Strength is the SMA gap
/// normalized by the long SMA, capped at 1.
#[derive(Debug, Clone)]
pub struct SmaCrossover {
    short_window: usize,
    long_window: usize,
}

impl SmaCrossover {
    /// Create a source with the given windows
    pub fn new(short_window: usize, long_window: usize) -> Self {
        Self {
            short_window,
            long_window,
        }
    }

    fn sma(closes: &[Decimal], window: usize) -> Decimal {
        let slice = &closes[closes.len() - window..];
        slice.iter().copied().sum::<Decimal>() / Decimal::from(window as u64)
    }
}

impl Default for SmaCrossover {
    fn default() -> Self {
        Self::new(20, 50)
    }
}

impl SignalSource for SmaCrossover {
    fn signal(&self, symbol: &str, history: &[Bar]) -> TradeSignal {
        let last_price = history.last().map(|b| b.close).unwrap_or(Decimal::ZERO);
        if history.len() < self.required_history() {
            return TradeSignal::hold(symbol, last_price, "insufficient data");
        }

        let closes: Vec<Decimal> = history.iter().map(|b| b.close).collect();
        let prev = &closes[..closes.len() - 1];

        let current_short = Self::sma(&closes, self.short_window);
        let current_long = Self::sma(&closes, self.long_window);
        let prev_short = Self::sma(prev, self.short_window);
        let prev_long = Self::sma(prev, self.long_window);

        let strength = if current_long == dec!(0) {
            dec!(0)
        } else {
            ((current_short - current_long).abs() / current_long).min(dec!(1))
        };

        if prev_short <= prev_long && current_short > current_long {
            TradeSignal {
                symbol: symbol.to_string(),
                signal: Signal::Buy,
                strength,
                price: last_price,
                reason: format!(
                    "golden cross: SMA{} over SMA{}",
                    self.short_window, self.long_window
                ),
            }
        } else if prev_short >= prev_long && current_short < current_long {
            TradeSignal {
                symbol: symbol.to_string(),
                signal: Signal::Sell,
                strength,
                price: last_price,
                reason: format!(
                    "death cross: SMA{} under SMA{}",
                    self.short_window, self.long_window
                ),
            }
        } else {
            TradeSignal::hold(symbol, last_price, "no crossover")
        }
    }

    fn required_history(&self) -> usize {
        self.long_window + 1
    }

    fn name(&self) -> &str {
        "sma-crossover"
    }
}
