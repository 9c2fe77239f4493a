//! CSV-backed market data store

use crate::broker::{Bar, BrokerError, MarketData, Timeframe};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    close: Decimal,
    #[serde(default)]
    volume: Decimal,
}

/// Daily bars loaded from `<dir>/<SYMBOL>.csv` files
///
/// Each file holds `date,close,volume` rows. Malformed rows are logged and
/// skipped; a missing file simply leaves the symbol out of the store.
pub struct CsvStore {
    bars: HashMap<String, Vec<Bar>>,
}

impl CsvStore {
    /// Load every requested symbol from a data directory
    pub fn load(dir: impl AsRef<Path>, symbols: &[String]) -> Self {
        let dir = dir.as_ref();
        let mut bars = HashMap::new();

        for symbol in symbols {
            let path = dir.join(format!("{symbol}.csv"));
            match Self::load_file(&path) {
                Ok(loaded) if !loaded.is_empty() => {
                    tracing::info!(symbol = %symbol, rows = loaded.len(), "loaded bar file");
                    bars.insert(symbol.clone(), loaded);
                }
                Ok(_) => tracing::warn!(symbol = %symbol, "bar file is empty"),
                Err(e) => {
                    tracing::warn!(symbol = %symbol, path = %path.display(), error = %e, "failed to load bar file")
                }
            }
        }

        Self { bars }
    }

    fn load_file(path: &Path) -> Result<Vec<Bar>, csv::Error> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut bars = vec![];
        for record in reader.deserialize::<CsvBar>() {
            match record {
                Ok(row) => bars.push(Bar {
                    date: row.date,
                    close: row.close,
                    volume: row.volume,
                }),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping malformed row"),
            }
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    /// Symbols with at least one bar loaded
    pub fn symbols(&self) -> Vec<String> {
        self.bars.keys().cloned().collect()
    }
}

#[async_trait]
impl MarketData for CsvStore {
    async fn get_market_price(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        self.bars
            .get(symbol)
            .and_then(|bars| bars.last())
            .map(|bar| bar.close)
            .ok_or_else(|| BrokerError::PriceUnavailable(symbol.to_string()))
    }

    async fn get_historical_bars(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        _timeframe: Timeframe,
    ) -> Result<Vec<Bar>, BrokerError> {
        let bars = self
            .bars
            .get(symbol)
            .ok_or_else(|| BrokerError::Api(format!("no data loaded for {symbol}")))?;
        Ok(bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_load_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "AAPL.csv",
            "date,close,volume\n2024-01-03,185.5,1000\n2024-01-02,184.0,900\n",
        );

        let store = CsvStore::load(dir.path(), &["AAPL".to_string()]);
        let bars = store
            .get_historical_bars(
                "AAPL",
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                Timeframe::Day,
            )
            .await
            .unwrap();

        // Rows are sorted on load
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, dec!(184.0));
        assert_eq!(bars[1].close, dec!(185.5));
    }

    #[tokio::test]
    async fn test_malformed_rows_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "AAPL.csv",
            "date,close,volume\n2024-01-02,184.0,900\nnot-a-date,x,y\n2024-01-03,185.5,1000\n",
        );

        let store = CsvStore::load(dir.path(), &["AAPL".to_string()]);
        let price = store.get_market_price("AAPL").await.unwrap();
        assert_eq!(price, dec!(185.5));
    }

    #[tokio::test]
    async fn test_missing_file_leaves_symbol_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::load(dir.path(), &["MSFT".to_string()]);
        assert!(store.symbols().is_empty());
        assert!(store.get_market_price("MSFT").await.is_err());
    }
}
