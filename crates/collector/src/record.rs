//! Typed records produced by the normalizer.
//!
//! Prices and sizes stay as the exchange's decimal strings end to end, so
//! nothing is lost to float conversion between the feed and the CSV row.

use std::io::{self, Write};

/// Record kind, one output file per kind within a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Trades,
    Quotes,
}

impl RecordKind {
    /// Output file name within the partition directory
    pub fn file_name(&self) -> &'static str {
        match self {
            RecordKind::Trades => "trades.gz",
            RecordKind::Quotes => "quotes.gz",
        }
    }

    /// Ordered column names for this kind's CSV header
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Trades => TRADE_COLUMNS,
            RecordKind::Quotes => QUOTE_COLUMNS,
        }
    }

    /// Label used in metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Trades => "trades",
            RecordKind::Quotes => "quotes",
        }
    }
}

pub const TRADE_COLUMNS: &[&str] = &[
    "exchange",
    "symbol",
    "timestamp",
    "event_timestamp",
    "local_timestamp",
    "trade_id",
    "side",
    "price",
    "amount",
];

pub const QUOTE_COLUMNS: &[&str] = &[
    "exchange",
    "symbol",
    "timestamp",
    "event_timestamp",
    "local_timestamp",
    "is_snapshot",
    "ask_amount",
    "ask_price",
    "bid_price",
    "bid_amount",
];

/// Trade aggressor side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    /// Map the feed's side string. Anything other than "Buy" is a sell.
    pub fn from_feed(s: &str) -> Self {
        if s == "Buy" {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}

/// One trade print. All timestamps are microseconds since the Unix epoch.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub exchange: &'static str,
    pub symbol: String,
    pub timestamp: i64,
    pub event_timestamp: i64,
    pub local_timestamp: i64,
    pub trade_id: String,
    pub side: Side,
    pub price: String,
    pub amount: String,
}

/// One top-of-book quote. Only the best bid/ask level is captured.
#[derive(Debug, Clone)]
pub struct QuoteRecord {
    pub exchange: &'static str,
    pub symbol: String,
    pub timestamp: i64,
    pub event_timestamp: i64,
    pub local_timestamp: i64,
    pub is_snapshot: bool,
    pub ask_amount: String,
    pub ask_price: String,
    pub bid_price: String,
    pub bid_amount: String,
}

/// A normalized record awaiting flush.
#[derive(Debug, Clone)]
pub enum Record {
    Trade(TradeRecord),
    Quote(QuoteRecord),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Trade(_) => RecordKind::Trades,
            Record::Quote(_) => RecordKind::Quotes,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Record::Trade(t) => &t.symbol,
            Record::Quote(q) => &q.symbol,
        }
    }

    pub fn local_timestamp(&self) -> i64 {
        match self {
            Record::Trade(t) => t.local_timestamp,
            Record::Quote(q) => q.local_timestamp,
        }
    }

    /// Write this record as one CSV line in its kind's column order.
    ///
    /// Field values never contain the delimiter (symbols, decimal strings,
    /// integers), so no quoting is needed.
    pub fn write_csv_row<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            Record::Trade(t) => writeln!(
                w,
                "{},{},{},{},{},{},{},{},{}",
                t.exchange,
                t.symbol,
                t.timestamp,
                t.event_timestamp,
                t.local_timestamp,
                t.trade_id,
                t.side.as_str(),
                t.price,
                t.amount,
            ),
            Record::Quote(q) => writeln!(
                w,
                "{},{},{},{},{},{},{},{},{},{}",
                q.exchange,
                q.symbol,
                q.timestamp,
                q.event_timestamp,
                q.local_timestamp,
                q.is_snapshot,
                q.ask_amount,
                q.ask_price,
                q.bid_price,
                q.bid_amount,
            ),
        }
    }
}
