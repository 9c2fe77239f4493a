//! Risk management module
//!
//! Position sizing and trade-admission checks under a configured risk budget

mod gate;
mod limits;
mod types;

pub use gate::RiskGate;
pub use limits::RiskLimits;
pub use types::{Admission, RejectReason, RiskError};
