//! trade-sentinel: Risk-gated trade execution and historical simulation engine
//!
//! This library provides the core components for:
//! - Position sizing and trade admission under a risk budget
//! - Per-symbol stop-loss/take-profit monitoring with automatic exits
//! - Day-stepped backtesting against a virtual portfolio
//! - Performance metrics (Sharpe, Sortino, drawdown, profit factor, ...)
//! - Broker and signal-source adapter contracts
//! - CSV-backed historical data for offline runs
//! - Structured logging and Prometheus metrics

pub mod backtest;
pub mod broker;
pub mod cli;
pub mod config;
pub mod data;
pub mod risk;
pub mod signal;
pub mod stops;
pub mod telemetry;
