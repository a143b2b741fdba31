//! bybit-collector: Bybit linear market data collection runtime components
//!
//! This crate provides the core components for streaming trades and
//! top-of-book quotes from Bybit, buffering them per output partition, and
//! flushing them to date-partitioned gzip CSV files.

pub mod buffer;
pub mod bybit;
pub mod config;
pub mod error;
pub mod flusher;
pub mod metrics;
pub mod normalize;
pub mod partition;
pub mod record;
pub mod writer;

pub use buffer::RecordBuffer;
pub use bybit::{BybitConnector, ConnectionState};
pub use config::CollectorConfig;
pub use error::{ConfigError, WriterError};
pub use flusher::Flusher;
pub use partition::PartitionKey;
pub use record::{QuoteRecord, Record, RecordKind, Side, TradeRecord};
pub use writer::PartitionedWriter;
