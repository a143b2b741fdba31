//! Bybit connection manager.
//!
//! Owns the feed connection lifecycle: connect, subscribe, stream, detect
//! fault, back off, reconnect, forever. Every data message is normalized
//! and enqueued into the shared record buffer; the connector itself holds
//! no record-level state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, trace, warn};

use super::messages::{BybitWsMessage, QUOTE_TOPIC_PREFIX, TRADE_TOPIC_PREFIX};
use super::websocket::{BybitWebSocket, BybitWsError, PING_INTERVAL_SECS};
use crate::buffer::RecordBuffer;
use crate::config::CollectorConfig;
use crate::metrics;
use crate::normalize::normalize;
use crate::partition::PartitionKey;

/// Connection lifecycle state. There is no terminal state: after a fault
/// the connector waits out the backoff and connects again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
    Streaming,
    Faulted,
}

/// Build the subscription topic list: trade and top-of-book streams for
/// every configured symbol, upper-cased.
pub fn topics_for_symbols(symbols: &[String]) -> Vec<String> {
    let mut topics = Vec::with_capacity(symbols.len() * 2);
    for symbol in symbols {
        let symbol = symbol.to_ascii_uppercase();
        topics.push(format!("{TRADE_TOPIC_PREFIX}{symbol}"));
        topics.push(format!("{QUOTE_TOPIC_PREFIX}{symbol}"));
    }
    topics
}

pub struct BybitConnector {
    ws_url: String,
    topics: Vec<String>,
    reconnect_delay: Duration,
    state: ConnectionState,
    buffer: Arc<Mutex<RecordBuffer>>,
}

impl BybitConnector {
    pub fn new(config: &CollectorConfig, buffer: Arc<Mutex<RecordBuffer>>) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            topics: topics_for_symbols(&config.symbols),
            reconnect_delay: config.reconnect_delay,
            state: ConnectionState::Disconnected,
            buffer,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run the connection loop until shutdown. Transport faults and read
    /// timeouts trigger a fixed-delay reconnect; there is no retry cap.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.connect_and_stream(&mut shutdown).await {
                Ok(()) => break, // shutdown requested mid-stream
                Err(e) => {
                    self.state = ConnectionState::Faulted;
                    metrics::set_connected(false);
                    metrics::inc_reconnect();
                    warn!(
                        error = %e,
                        delay_secs = self.reconnect_delay.as_secs(),
                        "Connection fault, reconnecting"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        metrics::set_connected(false);
        info!("Connector stopped");
    }

    /// One connection's lifetime: Connecting → Subscribed → Streaming.
    /// Returns Ok only on shutdown; every fault is an Err.
    async fn connect_and_stream(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), BybitWsError> {
        self.state = ConnectionState::Connecting;
        let mut ws = BybitWebSocket::connect(&self.ws_url).await?;

        ws.subscribe(&self.topics).await?;
        self.state = ConnectionState::Subscribed;
        info!(topics = self.topics.len(), "Subscribed to Bybit topics");

        self.state = ConnectionState::Streaming;
        metrics::set_connected(true);

        let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ping_interval.tick() => {
                    ws.ping().await?;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        ws.close().await.ok();
                        return Ok(());
                    }
                }
                result = ws.recv() => {
                    match result {
                        Ok(msg) => self.handle_message(msg),
                        // A malformed payload is not a connection fault:
                        // drop the message and keep streaming.
                        Err(BybitWsError::Json(_)) => {
                            metrics::inc_decode_discard();
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    fn handle_message(&self, msg: BybitWsMessage) {
        match msg {
            BybitWsMessage::Topic(topic_msg) => {
                let is_quote_topic = topic_msg.topic.starts_with(QUOTE_TOPIC_PREFIX);
                let local_ts_us = Utc::now().timestamp_micros();

                match normalize(topic_msg, local_ts_us) {
                    Ok(records) => {
                        if records.is_empty() {
                            if is_quote_topic {
                                metrics::inc_one_sided_quote();
                            }
                            return;
                        }

                        let mut buffer = self.buffer.lock().unwrap();
                        for record in records {
                            let kind = record.kind();
                            let key = PartitionKey::resolve(
                                record.symbol(),
                                kind,
                                record.local_timestamp(),
                            );
                            buffer.enqueue(key, kind.columns(), record);
                            metrics::inc_records_enqueued(kind.label(), 1);
                        }
                    }
                    Err(_) => {
                        metrics::inc_decode_discard();
                    }
                }
            }
            BybitWsMessage::Op(op) => {
                if op.is_subscribe_failure() {
                    warn!(ret_msg = ?op.ret_msg, "Subscribe rejected");
                } else if op.ret_msg.as_deref() == Some("pong") {
                    trace!("Pong received");
                } else {
                    debug!(op = ?op.op, success = ?op.success, "Control response");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(symbols: &[&str]) -> CollectorConfig {
        CollectorConfig::new(
            symbols.iter().map(ToString::to_string).collect(),
            "./data",
        )
        .unwrap()
    }

    #[test]
    fn test_topics_for_symbols() {
        let topics = topics_for_symbols(&["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
        assert_eq!(
            topics,
            vec![
                "publicTrade.BTCUSDT",
                "orderbook.1.BTCUSDT",
                "publicTrade.ETHUSDT",
                "orderbook.1.ETHUSDT",
            ]
        );
    }

    #[test]
    fn test_topics_uppercase_symbols() {
        let topics = topics_for_symbols(&["btcusdt".to_string()]);
        assert_eq!(topics, vec!["publicTrade.BTCUSDT", "orderbook.1.BTCUSDT"]);
    }

    #[test]
    fn test_connector_starts_disconnected() {
        let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
        let connector = BybitConnector::new(&test_config(&["BTCUSDT"]), buffer);
        assert_eq!(connector.state(), ConnectionState::Disconnected);
        assert_eq!(connector.topics.len(), 2);
    }

    #[test]
    fn test_handle_trade_message_enqueues_records() {
        let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
        let connector = BybitConnector::new(&test_config(&["BTCUSDT"]), Arc::clone(&buffer));

        let raw = r#"{"topic":"publicTrade.BTCUSDT","type":"snapshot","ts":1700000000000,"data":[{"T":1700000000000,"i":"1","S":"Buy","p":"50000.5","v":"0.01"},{"T":1700000000001,"i":"2","S":"Sell","p":"50000.0","v":"0.02"}]}"#;
        let msg: BybitWsMessage = serde_json::from_str(raw).unwrap();
        connector.handle_message(msg);

        assert_eq!(buffer.lock().unwrap().pending_records(), 2);
    }

    #[test]
    fn test_handle_one_sided_quote_enqueues_nothing() {
        let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
        let connector = BybitConnector::new(&test_config(&["BTCUSDT"]), Arc::clone(&buffer));

        let raw = r#"{"topic":"orderbook.1.BTCUSDT","type":"delta","ts":1700000001000,"data":{"s":"BTCUSDT","b":[["49999.5","2.0"]],"a":[],"u":2,"seq":101}}"#;
        let msg: BybitWsMessage = serde_json::from_str(raw).unwrap();
        connector.handle_message(msg);

        assert_eq!(buffer.lock().unwrap().pending_records(), 0);
    }

    #[test]
    fn test_handle_control_response_enqueues_nothing() {
        let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
        let connector = BybitConnector::new(&test_config(&["BTCUSDT"]), Arc::clone(&buffer));

        let raw = r#"{"success":true,"ret_msg":"","conn_id":"abc","op":"subscribe"}"#;
        let msg: BybitWsMessage = serde_json::from_str(raw).unwrap();
        connector.handle_message(msg);

        assert_eq!(buffer.lock().unwrap().pending_records(), 0);
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown_before_connect() {
        let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
        let mut connector = BybitConnector::new(
            &test_config(&["BTCUSDT"]).with_ws_url("ws://127.0.0.1:1"),
            buffer,
        );

        let (tx, rx) = watch::channel(true);
        connector.run(rx).await;
        assert_eq!(connector.state(), ConnectionState::Disconnected);
        drop(tx);
    }

    #[tokio::test]
    async fn test_run_faults_and_retries_until_shutdown() {
        // Nothing listens on this port: every attempt faults, and the
        // connector keeps retrying until told to stop.
        let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
        let config = test_config(&["BTCUSDT"])
            .with_ws_url("ws://127.0.0.1:9")
            .with_reconnect_delay(Duration::from_millis(10));
        let mut connector = BybitConnector::new(&config, buffer);

        let (tx, rx) = watch::channel(false);
        let shutdown = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(true).ok();
            tx
        });

        connector.run(rx).await;
        assert_eq!(connector.state(), ConnectionState::Disconnected);
        shutdown.await.unwrap();
    }
}
