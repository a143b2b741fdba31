//! Normalizes decoded feed messages into typed records.
//!
//! Pure: the receipt timestamp is captured by the caller at the moment of
//! normalization and passed in, so every path through here is testable
//! without a clock.

use crate::bybit::messages::{
    OrderbookLevels, TopicMessage, TradeEntry, QUOTE_TOPIC_PREFIX, TRADE_TOPIC_PREFIX,
};
use crate::config::EXCHANGE;
use crate::record::{QuoteRecord, Record, Side, TradeRecord};

/// Millisecond to microsecond conversion. Integer multiplication only; no
/// sub-millisecond precision is invented.
pub fn ms_to_us(ms: i64) -> i64 {
    ms * 1_000
}

/// Convert one topic message into zero or more records.
///
/// Trade topics emit one record per fill in the data list. Quote topics
/// emit at most one record, from the best bid/ask levels; updates where
/// either side is empty produce nothing. Unknown topics produce nothing.
pub fn normalize(msg: TopicMessage, local_ts_us: i64) -> Result<Vec<Record>, serde_json::Error> {
    if let Some(symbol) = msg.topic.strip_prefix(TRADE_TOPIC_PREFIX) {
        let symbol = symbol.to_string();
        let event_ts = ms_to_us(msg.ts);
        let entries: Vec<TradeEntry> = serde_json::from_value(msg.data)?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                Record::Trade(TradeRecord {
                    exchange: EXCHANGE,
                    symbol: symbol.clone(),
                    timestamp: ms_to_us(entry.trade_time_ms),
                    event_timestamp: event_ts,
                    local_timestamp: local_ts_us,
                    trade_id: entry.trade_id,
                    side: Side::from_feed(&entry.side),
                    price: entry.price,
                    amount: entry.size,
                })
            })
            .collect())
    } else if let Some(symbol) = msg.topic.strip_prefix(QUOTE_TOPIC_PREFIX) {
        let event_ts = ms_to_us(msg.ts);
        // Best-effort matching-engine time: cross timestamp when present,
        // event timestamp otherwise.
        let timestamp = match msg.cts {
            Some(cts) if cts != 0 => ms_to_us(cts),
            _ => event_ts,
        };

        let levels: OrderbookLevels = serde_json::from_value(msg.data)?;
        let (Some(bid), Some(ask)) = (levels.bids.first(), levels.asks.first()) else {
            // One-sided update: nothing to record at this layer.
            return Ok(Vec::new());
        };

        let [bid_price, bid_amount] = bid.clone();
        let [ask_price, ask_amount] = ask.clone();
        Ok(vec![Record::Quote(QuoteRecord {
            exchange: EXCHANGE,
            symbol: symbol.to_string(),
            timestamp,
            event_timestamp: event_ts,
            local_timestamp: local_ts_us,
            is_snapshot: msg.update_type.as_deref() == Some("snapshot"),
            ask_amount,
            ask_price,
            bid_price,
            bid_amount,
        })])
    } else {
        Ok(Vec::new())
    }
}
