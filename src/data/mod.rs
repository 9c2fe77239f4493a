//! Historical data module
//!
//! Loads daily bars from CSV files for offline backtesting

mod csv_store;

pub use csv_store::CsvStore;
