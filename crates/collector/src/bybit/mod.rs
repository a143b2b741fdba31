//! Bybit v5 public feed: message types, WebSocket client, and the
//! connection manager.

pub mod connector;
pub mod messages;
pub mod websocket;

pub use connector::{topics_for_symbols, BybitConnector, ConnectionState};
pub use messages::BybitWsMessage;
pub use websocket::{BybitWebSocket, BybitWsError};
