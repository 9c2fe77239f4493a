//! Exit condition configuration

use crate::broker::PositionSide;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Stop-loss kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopKind {
    /// Fixed stop price
    Fixed,
    /// Stop derived from a percentage below/above entry
    Percentage,
    /// Stop that ratchets with the price extreme
    Trailing,
}

/// Lifecycle state of an exit condition
///
/// Removal from the controller's table is the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopState {
    /// Config set, polled every tick
    Active,
    /// Exit order in flight
    Triggered,
}

/// Exit conditions for one symbol
///
/// All percentages are fractions (0.03 = 3%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitConfig {
    /// Symbol this config applies to
    pub symbol: String,
    /// Stop-loss kind
    pub kind: StopKind,
    /// Explicit stop price; for trailing stops this is the ratcheted value
    pub stop_price: Option<Decimal>,
    /// Stop distance from entry as a fraction
    pub stop_percentage: Option<Decimal>,
    /// Trailing distance from the price extreme as a fraction
    pub trailing_percentage: Option<Decimal>,
    /// Explicit take-profit price
    pub take_profit_price: Option<Decimal>,
    /// Take-profit distance from entry as a fraction
    pub take_profit_percentage: Option<Decimal>,
    /// Entry price; adopted from the broker if unset
    pub entry_price: Option<Decimal>,
    /// Highest price seen since the config was set (long trailing)
    pub highest_price_seen: Option<Decimal>,
    /// Lowest price seen since the config was set (short trailing)
    pub lowest_price_seen: Option<Decimal>,
    /// Lifecycle state
    pub state: StopState,
}

impl ExitConfig {
    /// Create a config with no thresholds set
    pub fn new(symbol: &str, kind: StopKind) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind,
            stop_price: None,
            stop_percentage: None,
            trailing_percentage: None,
            take_profit_price: None,
            take_profit_percentage: None,
            entry_price: None,
            highest_price_seen: None,
            lowest_price_seen: None,
            state: StopState::Active,
        }
    }

    /// Ratchet trailing bookkeeping with a new price
    ///
    /// The tracked extreme only ever moves in the position's favor, so the
    /// derived stop never loosens on a pullback.
    pub fn update_trailing(&mut self, current_price: Decimal, side: PositionSide) {
        let Some(trailing) = self.trailing_percentage else {
            return;
        };
        match side {
            PositionSide::Long => {
                if self.highest_price_seen.is_none_or(|h| current_price > h) {
                    self.highest_price_seen = Some(current_price);
                    self.stop_price = Some(current_price * (dec!(1) - trailing));
                }
            }
            PositionSide::Short => {
                if self.lowest_price_seen.is_none_or(|l| current_price < l) {
                    self.lowest_price_seen = Some(current_price);
                    self.stop_price = Some(current_price * (dec!(1) + trailing));
                }
            }
        }
    }

    /// The stop price in effect: explicit price wins, else derived from
    /// `stop_percentage` and entry in the direction fitting the side
    pub fn effective_stop(&self, side: PositionSide) -> Option<Decimal> {
        if let Some(price) = self.stop_price {
            return Some(price);
        }
        let (pct, entry) = (self.stop_percentage?, self.entry_price?);
        Some(match side {
            PositionSide::Long => entry * (dec!(1) - pct),
            PositionSide::Short => entry * (dec!(1) + pct),
        })
    }

    /// The take-profit price in effect
    pub fn effective_take_profit(&self, side: PositionSide) -> Option<Decimal> {
        if let Some(price) = self.take_profit_price {
            return Some(price);
        }
        let (pct, entry) = (self.take_profit_percentage?, self.entry_price?);
        Some(match side {
            PositionSide::Long => entry * (dec!(1) + pct),
            PositionSide::Short => entry * (dec!(1) - pct),
        })
    }

    /// Whether the stop-loss fires at this price
    pub fn should_trigger_stop(&self, current_price: Decimal, side: PositionSide) -> bool {
        match self.effective_stop(side) {
            Some(stop) => match side {
                PositionSide::Long => current_price <= stop,
                PositionSide::Short => current_price >= stop,
            },
            None => false,
        }
    }

    /// Whether the take-profit fires at this price
    pub fn should_trigger_take_profit(&self, current_price: Decimal, side: PositionSide) -> bool {
        match self.effective_take_profit(side) {
            Some(target) => match side {
                PositionSide::Long => current_price >= target,
                PositionSide::Short => current_price <= target,
            },
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_stop_trigger_long() {
        let mut config = ExitConfig::new("AAPL", StopKind::Fixed);
        config.stop_price = Some(dec!(145));
        config.entry_price = Some(dec!(150));

        assert!(!config.should_trigger_stop(dec!(146), PositionSide::Long));
        assert!(config.should_trigger_stop(dec!(145), PositionSide::Long));
        assert!(config.should_trigger_stop(dec!(144), PositionSide::Long));
    }

    #[test]
    fn test_fixed_stop_trigger_short() {
        let mut config = ExitConfig::new("AAPL", StopKind::Fixed);
        config.stop_price = Some(dec!(155));
        config.entry_price = Some(dec!(150));

        assert!(!config.should_trigger_stop(dec!(154), PositionSide::Short));
        assert!(config.should_trigger_stop(dec!(156), PositionSide::Short));
    }

    #[test]
    fn test_percentage_stop_derived_from_entry() {
        let mut config = ExitConfig::new("AAPL", StopKind::Percentage);
        config.stop_percentage = Some(dec!(0.02));
        config.entry_price = Some(dec!(150));

        // 150 * 0.98 = 147
        assert_eq!(config.effective_stop(PositionSide::Long), Some(dec!(147.00)));
        assert!(!config.should_trigger_stop(dec!(148), PositionSide::Long));
        assert!(config.should_trigger_stop(dec!(146), PositionSide::Long));
    }

    #[test]
    fn test_percentage_stop_short_mirrored() {
        let mut config = ExitConfig::new("AAPL", StopKind::Percentage);
        config.stop_percentage = Some(dec!(0.02));
        config.entry_price = Some(dec!(150));

        assert_eq!(config.effective_stop(PositionSide::Short), Some(dec!(153.00)));
        assert!(config.should_trigger_stop(dec!(154), PositionSide::Short));
    }

    #[test]
    fn test_stop_without_price_or_percentage_never_fires() {
        let config = ExitConfig::new("AAPL", StopKind::Fixed);
        assert!(!config.should_trigger_stop(dec!(1), PositionSide::Long));
    }

    #[test]
    fn test_trailing_ratchet_long() {
        let mut config = ExitConfig::new("AAPL", StopKind::Trailing);
        config.trailing_percentage = Some(dec!(0.03));
        config.entry_price = Some(dec!(150));

        config.update_trailing(dec!(152), PositionSide::Long);
        assert_eq!(config.highest_price_seen, Some(dec!(152)));
        assert_eq!(config.stop_price, Some(dec!(147.44)));

        config.update_trailing(dec!(155), PositionSide::Long);
        assert_eq!(config.stop_price, Some(dec!(150.35)));

        // Pullback leaves the stop untouched
        config.update_trailing(dec!(153), PositionSide::Long);
        assert_eq!(config.highest_price_seen, Some(dec!(155)));
        assert_eq!(config.stop_price, Some(dec!(150.35)));

        assert!(config.should_trigger_stop(dec!(150.34), PositionSide::Long));
        assert!(!config.should_trigger_stop(dec!(150.36), PositionSide::Long));
    }

    #[test]
    fn test_trailing_ratchet_short() {
        let mut config = ExitConfig::new("AAPL", StopKind::Trailing);
        config.trailing_percentage = Some(dec!(0.03));
        config.entry_price = Some(dec!(150));

        config.update_trailing(dec!(148), PositionSide::Short);
        assert_eq!(config.lowest_price_seen, Some(dec!(148)));
        assert_eq!(config.stop_price, Some(dec!(152.44)));

        config.update_trailing(dec!(145), PositionSide::Short);
        assert_eq!(config.stop_price, Some(dec!(149.35)));

        // A bounce does not loosen the stop
        config.update_trailing(dec!(147), PositionSide::Short);
        assert_eq!(config.stop_price, Some(dec!(149.35)));
    }

    #[test]
    fn test_take_profit_fixed_long() {
        let mut config = ExitConfig::new("AAPL", StopKind::Fixed);
        config.take_profit_price = Some(dec!(160));
        config.entry_price = Some(dec!(150));

        assert!(!config.should_trigger_take_profit(dec!(159), PositionSide::Long));
        assert!(config.should_trigger_take_profit(dec!(161), PositionSide::Long));
    }

    #[test]
    fn test_take_profit_percentage() {
        let mut config = ExitConfig::new("AAPL", StopKind::Fixed);
        config.take_profit_percentage = Some(dec!(0.05));
        config.entry_price = Some(dec!(150));

        // 150 * 1.05 = 157.5
        assert!(!config.should_trigger_take_profit(dec!(157), PositionSide::Long));
        assert!(config.should_trigger_take_profit(dec!(158), PositionSide::Long));
    }

    #[test]
    fn test_take_profit_short_mirrored() {
        let mut config = ExitConfig::new("AAPL", StopKind::Fixed);
        config.take_profit_percentage = Some(dec!(0.05));
        config.entry_price = Some(dec!(150));

        // 150 * 0.95 = 142.5
        assert!(config.should_trigger_take_profit(dec!(142), PositionSide::Short));
        assert!(!config.should_trigger_take_profit(dec!(143), PositionSide::Short));
    }
}
