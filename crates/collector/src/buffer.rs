//! In-memory buffer of pending records, keyed by output partition.
//!
//! The buffer is the only state shared between the ingestion loop and the
//! flusher; callers wrap it in a mutex and keep each operation inside one
//! lock acquisition, so a drain sees every record in full or not at all.

use std::collections::HashMap;
use std::mem;

use crate::partition::PartitionKey;
use crate::record::Record;

/// Ordered column names for a partition's CSV header.
pub type Schema = &'static [&'static str];

struct BufferEntry {
    schema: Schema,
    pending: Vec<Record>,
}

/// Pending records per partition plus each partition's column schema.
#[derive(Default)]
pub struct RecordBuffer {
    entries: HashMap<PartitionKey, BufferEntry>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its partition's pending sequence. The schema is
    /// recorded on first use and never revalidated; a partition's schema is
    /// fixed by its record kind.
    pub fn enqueue(&mut self, key: PartitionKey, schema: Schema, record: Record) {
        self.entries
            .entry(key)
            .or_insert_with(|| BufferEntry {
                schema,
                pending: Vec::new(),
            })
            .pending
            .push(record);
    }

    /// Move out every non-empty pending sequence, leaving the entries in
    /// place so later records for the same partition reuse them. Partitions
    /// with nothing pending are skipped entirely.
    pub fn drain_all(&mut self) -> Vec<(PartitionKey, Schema, Vec<Record>)> {
        self.entries
            .iter_mut()
            .filter(|(_, entry)| !entry.pending.is_empty())
            .map(|(key, entry)| (key.clone(), entry.schema, mem::take(&mut entry.pending)))
            .collect()
    }

    /// Total records currently pending across all partitions.
    pub fn pending_records(&self) -> usize {
        self.entries.values().map(|e| e.pending.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordKind, Side, TradeRecord, TRADE_COLUMNS};

    fn trade(symbol: &str, trade_id: &str) -> Record {
        Record::Trade(TradeRecord {
            exchange: "bybit-linear",
            symbol: symbol.to_string(),
            timestamp: 1_700_000_000_000_000,
            event_timestamp: 1_700_000_000_000_000,
            local_timestamp: 1_700_000_000_000_000,
            trade_id: trade_id.to_string(),
            side: Side::Buy,
            price: "100.0".to_string(),
            amount: "1.0".to_string(),
        })
    }

    fn key(symbol: &str) -> PartitionKey {
        PartitionKey::resolve(symbol, RecordKind::Trades, 1_700_000_000_000_000)
    }

    #[test]
    fn test_drain_clears_pending_and_keeps_entry() {
        let mut buffer = RecordBuffer::new();
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "1"));
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "2"));

        let drained = buffer.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].2.len(), 2);
        assert_eq!(buffer.pending_records(), 0);

        // Entry persists: a later record for the same key drains alone.
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "3"));
        let drained = buffer.drain_all();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].2.len(), 1);
    }

    #[test]
    fn test_drain_skips_empty_partitions() {
        let mut buffer = RecordBuffer::new();
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "1"));
        assert_eq!(buffer.drain_all().len(), 1);

        // Drained entries stay in the map but must not reappear.
        assert!(buffer.drain_all().is_empty());
        assert!(buffer.drain_all().is_empty());
    }

    #[test]
    fn test_drain_preserves_enqueue_order() {
        let mut buffer = RecordBuffer::new();
        for i in 0..5 {
            buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", &i.to_string()));
        }

        let drained = buffer.drain_all();
        let ids: Vec<String> = drained[0]
            .2
            .iter()
            .map(|r| match r {
                Record::Trade(t) => t.trade_id.clone(),
                Record::Quote(_) => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_partitions_drain_independently() {
        let mut buffer = RecordBuffer::new();
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "1"));
        buffer.enqueue(key("ETHUSDT"), TRADE_COLUMNS, trade("ETHUSDT", "2"));

        let drained = buffer.drain_all();
        assert_eq!(drained.len(), 2);
        assert_eq!(buffer.pending_records(), 0);
    }

    #[test]
    fn test_enqueue_after_drain_is_not_lost() {
        let mut buffer = RecordBuffer::new();
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "1"));
        let drained = buffer.drain_all();
        assert_eq!(drained[0].2.len(), 1);

        // A record arriving after the drain belongs to the next batch.
        buffer.enqueue(key("BTCUSDT"), TRADE_COLUMNS, trade("BTCUSDT", "2"));
        let next = buffer.drain_all();
        assert_eq!(next[0].2.len(), 1);
        match &next[0].2[0] {
            Record::Trade(t) => assert_eq!(t.trade_id, "2"),
            Record::Quote(_) => unreachable!(),
        }
    }
}
