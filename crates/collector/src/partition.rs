//! Partition resolution: which output file a record belongs to.
//!
//! The UTC calendar date comes from the *receipt* timestamp, not the
//! exchange's event timestamp, so partitioning follows local ingestion
//! time even when the feed clock disagrees with wall time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate};

use crate::config::EXCHANGE;
use crate::record::RecordKind;

/// Identifies one output file: exchange, UTC date, instrument, kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    pub exchange: &'static str,
    pub date: NaiveDate,
    pub symbol: String,
    pub kind: RecordKind,
}

impl PartitionKey {
    /// Resolve the partition for a record received at `local_ts_us`
    /// (microseconds since the Unix epoch). Deterministic: the same inputs
    /// always produce the same key.
    pub fn resolve(symbol: &str, kind: RecordKind, local_ts_us: i64) -> Self {
        let date = DateTime::from_timestamp_micros(local_ts_us)
            .map(|dt| dt.date_naive())
            .unwrap_or_default();
        Self {
            exchange: EXCHANGE,
            date,
            symbol: symbol.to_ascii_lowercase(),
            kind,
        }
    }

    /// Render the file path under `root`:
    /// `{root}/{exchange}/{YYYY-MM-DD}/{symbol}/{trades.gz|quotes.gz}`
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join(self.exchange)
            .join(self.date.format("%Y-%m-%d").to_string())
            .join(&self.symbol)
            .join(self.kind.file_name())
    }
}
