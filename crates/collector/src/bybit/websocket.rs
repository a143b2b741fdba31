//! Bybit v5 public WebSocket client.
//!
//! Connects to wss://stream.bybit.com/v5/public/linear and manages one
//! subscription batch per connection:
//! - Subscribe: {"op":"subscribe","args":["publicTrade.BTCUSDT",...]}
//! - Ping: protocol-level ping frames every 20s
//! - Read timeout: 90s of silence is treated as a dead connection

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async_with_config, tungstenite};
use tracing::{debug, info};

use super::messages::BybitWsMessage;

const MAX_MESSAGE_SIZE: usize = 1024 * 1024; // 1 MiB
const READ_TIMEOUT_SECS: u64 = 90;
pub const PING_INTERVAL_SECS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum BybitWsError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Read timeout")]
    ReadTimeout,
}

pub struct BybitWebSocket {
    ws: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

impl BybitWebSocket {
    /// Connect to the Bybit public WebSocket endpoint.
    pub async fn connect(url: &str) -> Result<Self, BybitWsError> {
        let config = tungstenite::protocol::WebSocketConfig {
            max_message_size: Some(MAX_MESSAGE_SIZE),
            ..Default::default()
        };

        info!(url = %url, "Connecting to Bybit WS");
        let (ws, _) = connect_async_with_config(url, Some(config), false).await?;
        info!("Connected to Bybit WS");

        Ok(Self { ws })
    }

    /// Send one subscribe control message listing all topics. The server's
    /// acknowledgment arrives in-stream as an op response; streaming begins
    /// as soon as this send succeeds.
    pub async fn subscribe(&mut self, topics: &[String]) -> Result<(), BybitWsError> {
        let msg = json!({
            "op": "subscribe",
            "args": topics,
        });

        debug!(topics = topics.len(), "Subscribing to Bybit topics");
        self.ws
            .send(tungstenite::Message::Text(msg.to_string()))
            .await?;
        Ok(())
    }

    /// Receive the next decoded message.
    ///
    /// A `Json` error means this single frame was malformed; the connection
    /// itself is still healthy and the caller may keep receiving.
    pub async fn recv(&mut self) -> Result<BybitWsMessage, BybitWsError> {
        let msg = timeout(Duration::from_secs(READ_TIMEOUT_SECS), self.ws.next())
            .await
            .map_err(|_| BybitWsError::ReadTimeout)?
            .ok_or(BybitWsError::ConnectionClosed)?
            .map_err(BybitWsError::WebSocket)?;

        match msg {
            tungstenite::Message::Text(text) => {
                let parsed: BybitWsMessage = serde_json::from_str(&text)?;
                Ok(parsed)
            }
            tungstenite::Message::Ping(data) => {
                self.ws.send(tungstenite::Message::Pong(data)).await?;
                // Recurse to get next real message
                Box::pin(self.recv()).await
            }
            tungstenite::Message::Close(_) => Err(BybitWsError::ConnectionClosed),
            _ => Box::pin(self.recv()).await,
        }
    }

    /// Send a ping to keep the connection alive.
    pub async fn ping(&mut self) -> Result<(), BybitWsError> {
        self.ws.send(tungstenite::Message::Ping(Vec::new())).await?;
        Ok(())
    }

    /// Close the connection.
    pub async fn close(&mut self) -> Result<(), BybitWsError> {
        self.ws.close(None).await?;
        Ok(())
    }
}
