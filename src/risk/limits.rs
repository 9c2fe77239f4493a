//! Risk limit configuration

use super::RiskError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Risk limits for a gate instance
///
/// Immutable once the gate is constructed; one active set per gate.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskLimits {
    /// Maximum notional value of a single position
    #[serde(default = "default_max_position_value")]
    pub max_position_value: Decimal,
    /// Maximum combined daily loss before trading halts
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Maximum concurrent open positions
    #[serde(default = "default_max_open_positions")]
    pub max_open_positions: usize,
    /// Fraction of equity risked per trade (0 < f <= 1)
    #[serde(default = "default_risk_fraction")]
    pub risk_fraction_per_trade: Decimal,
}

fn default_max_position_value() -> Decimal {
    dec!(10000)
}
fn default_max_daily_loss() -> Decimal {
    dec!(1000)
}
fn default_max_open_positions() -> usize {
    5
}
fn default_risk_fraction() -> Decimal {
    dec!(0.02)
}

impl RiskLimits {
    /// Validate the limit set
    pub fn validate(&self) -> Result<(), RiskError> {
        if self.risk_fraction_per_trade <= dec!(0) || self.risk_fraction_per_trade > dec!(1) {
            return Err(RiskError::InvalidLimits(format!(
                "risk_fraction_per_trade must be in (0, 1], got {}",
                self.risk_fraction_per_trade
            )));
        }
        if self.max_position_value <= dec!(0) {
            return Err(RiskError::InvalidLimits(
                "max_position_value must be positive".into(),
            ));
        }
        if self.max_daily_loss <= dec!(0) {
            return Err(RiskError::InvalidLimits(
                "max_daily_loss must be positive".into(),
            ));
        }
        if self.max_open_positions == 0 {
            return Err(RiskError::InvalidLimits(
                "max_open_positions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_value: default_max_position_value(),
            max_daily_loss: default_max_daily_loss(),
            max_open_positions: default_max_open_positions(),
            risk_fraction_per_trade: default_risk_fraction(),
        }
    }
}
