//! Stop-loss and take-profit module
//!
//! Per-symbol exit conditions tracked by a background poll loop that issues
//! market exit orders through the broker adapter when a condition fires

mod config;
mod controller;

pub use config::{ExitConfig, StopKind, StopState};
pub use controller::{ExitEvent, ExitReason, StopController};
