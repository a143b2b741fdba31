//! Bybit v5 public WebSocket message types.
//!
//! Two wire shapes share one connection:
//! - Data: {"topic":"publicTrade.BTCUSDT","type":"snapshot","ts":...,"data":[...]}
//! - Op responses: {"success":true,"ret_msg":"","op":"subscribe","conn_id":"..."}
//!
//! Reference: https://bybit-exchange.github.io/docs/v5/ws/connect

use serde::Deserialize;

/// Topic prefix for trade prints, one stream per symbol.
pub const TRADE_TOPIC_PREFIX: &str = "publicTrade.";

/// Topic prefix for level-1 (top of book) order book updates.
pub const QUOTE_TOPIC_PREFIX: &str = "orderbook.1.";

/// Top-level message from the Bybit public WebSocket.
/// Uses `#[serde(untagged)]` — variant order matters!
/// Topic must come first (most specific); Op matches any remaining object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BybitWsMessage {
    /// Channel data — has "topic" + "ts" + "data"
    Topic(TopicMessage),
    /// Subscribe acknowledgment, pong, or any other control response
    Op(OpResponse),
}

/// A data message on a subscribed topic. `data` stays untyped here; the
/// normalizer decodes it per topic kind.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicMessage {
    pub topic: String,
    /// "snapshot" or "delta"
    #[serde(rename = "type")]
    pub update_type: Option<String>,
    /// Event timestamp, milliseconds
    pub ts: i64,
    /// Matching-engine cross timestamp, milliseconds (order book topics)
    pub cts: Option<i64>,
    pub data: serde_json::Value,
}

/// Response to an outbound op ("subscribe", "ping").
#[derive(Debug, Clone, Deserialize)]
pub struct OpResponse {
    pub op: Option<String>,
    pub success: Option<bool>,
    pub ret_msg: Option<String>,
}

impl OpResponse {
    /// A subscribe response with success=false
    pub fn is_subscribe_failure(&self) -> bool {
        self.op.as_deref() == Some("subscribe") && self.success == Some(false)
    }
}

/// One fill inside a trade message's data list.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeEntry {
    /// Trade timestamp, milliseconds
    #[serde(rename = "T")]
    pub trade_time_ms: i64,
    /// Exchange-native trade id, opaque
    #[serde(rename = "i")]
    pub trade_id: String,
    /// "Buy" or "Sell"
    #[serde(rename = "S")]
    pub side: String,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "v")]
    pub size: String,
}

/// Level lists inside an orderbook.1 message. Each level is [price, size].
#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookLevels {
    #[serde(rename = "b", default)]
    pub bids: Vec<[String; 2]>,
    #[serde(rename = "a", default)]
    pub asks: Vec<[String; 2]>,
}
