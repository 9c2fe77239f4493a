//! Position sizing and trade-admission gate

use super::{Admission, RejectReason, RiskError, RiskLimits};
use crate::broker::AccountSnapshot;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};

/// Stateless-per-call sizing and admission checks, with a sticky daily-loss
/// circuit breaker
///
/// The halt flag is the only mutable state, so a gate can be shared behind
/// an `Arc` by API handlers and the trading loop alike.
pub struct RiskGate {
    limits: RiskLimits,
    halted: AtomicBool,
}

impl RiskGate {
    /// Create a gate, validating the limit set
    pub fn new(limits: RiskLimits) -> Result<Self, RiskError> {
        limits.validate()?;
        Ok(Self {
            limits,
            halted: AtomicBool::new(false),
        })
    }

    /// The active limit set
    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Calculate position size in whole units from the account's risk budget
    ///
    /// With a stop price the size is risk-per-unit based; without one it is
    /// capped notional. The result is clamped to buying power and
    /// `max_position_value`, floored, and never negative. Zero means "do not
    /// trade" — in particular a stop at the entry price has undefined
    /// risk-per-unit and sizes to zero rather than dividing by it.
    pub fn calculate_position_size(
        &self,
        account: &AccountSnapshot,
        entry_price: Decimal,
        stop_loss_price: Option<Decimal>,
    ) -> u64 {
        if entry_price <= dec!(0) {
            return 0;
        }

        let risk_amount = account.equity * self.limits.risk_fraction_per_trade;

        let mut quantity = match stop_loss_price {
            Some(stop) => {
                let risk_per_unit = (entry_price - stop).abs();
                if risk_per_unit == dec!(0) {
                    return 0;
                }
                risk_amount / risk_per_unit
            }
            None => self.limits.max_position_value.min(risk_amount) / entry_price,
        };

        // Clamp to buying power, then to max position value
        quantity = quantity.min(account.buying_power / entry_price);
        if quantity * entry_price > self.limits.max_position_value {
            quantity = self.limits.max_position_value / entry_price;
        }

        quantity.floor().to_u64().unwrap_or(0)
    }

    /// Check whether a new position may be opened
    ///
    /// Checks run in a fixed order and the first failure wins. Breaching the
    /// daily-loss limit trips a halt that sticks until
    /// [`reset_daily_limits`](Self::reset_daily_limits).
    pub fn can_open_position(&self, open_count: usize, account: &AccountSnapshot) -> Admission {
        if self.halted.load(Ordering::Acquire) {
            return Admission::Rejected(RejectReason::TradingHalted);
        }

        if open_count >= self.limits.max_open_positions {
            return Admission::Rejected(RejectReason::MaxPositionsReached(
                self.limits.max_open_positions,
            ));
        }

        let total_pnl = account.unrealized_pnl + account.realized_pnl;
        if total_pnl.abs() >= self.limits.max_daily_loss {
            self.halted.store(true, Ordering::Release);
            tracing::warn!(%total_pnl, "daily loss limit reached, halting trading");
            return Admission::Rejected(RejectReason::DailyLossLimitReached(total_pnl));
        }

        if account.buying_power <= dec!(0) {
            return Admission::Rejected(RejectReason::NoBuyingPower);
        }

        Admission::Allowed
    }

    /// Whether the circuit breaker is active
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    /// Halt trading manually
    pub fn halt_trading(&self, reason: &str) {
        self.halted.store(true, Ordering::Release);
        tracing::error!(reason, "trading halted");
    }

    /// Resume trading after a manual halt
    pub fn resume_trading(&self) {
        self.halted.store(false, Ordering::Release);
        tracing::info!("trading resumed");
    }

    /// Clear daily state at the start of a session
    pub fn reset_daily_limits(&self) {
        self.halted.store(false, Ordering::Release);
        tracing::info!("daily risk limits reset");
    }
}
