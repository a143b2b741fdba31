//! Prometheus metrics for the collector.
//!
//! Malformed payloads and one-sided quotes are dropped without log lines;
//! these counters are how operators observe the discard rates.

use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

const LABEL_KIND: &str = "kind";

/// Records enqueued into the buffer, by record kind
static RECORDS_ENQUEUED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bybit_collector_records_enqueued_total",
        "Records enqueued into the buffer",
        &[LABEL_KIND]
    )
    .expect("Failed to register records_enqueued metric")
});

/// Records written to storage, by record kind
static RECORDS_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "bybit_collector_records_written_total",
        "Records written to partition files",
        &[LABEL_KIND]
    )
    .expect("Failed to register records_written metric")
});

/// Messages discarded because the payload failed to decode
static DECODE_DISCARDS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bybit_collector_decode_discards_total",
        "Messages discarded due to decode failure"
    )
    .expect("Failed to register decode_discards metric")
});

/// Quote updates skipped because one book side was empty
static ONE_SIDED_QUOTES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bybit_collector_one_sided_quotes_total",
        "Quote updates skipped because bid or ask was missing"
    )
    .expect("Failed to register one_sided_quotes metric")
});

/// Reconnection attempts after a connection fault
static RECONNECTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "bybit_collector_reconnects_total",
        "Reconnection attempts after a fault"
    )
    .expect("Failed to register reconnects metric")
});

/// WebSocket connection status (1=streaming, 0=not)
static WEBSOCKET_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "bybit_collector_websocket_connected",
        "WebSocket connection status (1=streaming, 0=disconnected)"
    )
    .expect("Failed to register websocket_connected metric")
});

pub fn inc_records_enqueued(kind: &str, count: u64) {
    RECORDS_ENQUEUED.with_label_values(&[kind]).inc_by(count);
}

pub fn inc_records_written(kind: &str, count: u64) {
    RECORDS_WRITTEN.with_label_values(&[kind]).inc_by(count);
}

pub fn inc_decode_discard() {
    DECODE_DISCARDS.inc();
}

pub fn inc_one_sided_quote() {
    ONE_SIDED_QUOTES.inc();
}

pub fn inc_reconnect() {
    RECONNECTS.inc();
}

pub fn set_connected(connected: bool) {
    WEBSOCKET_CONNECTED.set(if connected { 1 } else { 0 });
}

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to encode metrics as UTF-8: {}", e)))
}
