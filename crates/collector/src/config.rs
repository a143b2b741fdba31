//! Collector configuration
//!
//! The command surface is deliberately small: a symbol list and an output
//! root. Everything else (endpoint, intervals) has compile-time defaults
//! that tests override through the builder methods.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Bybit v5 public linear WebSocket endpoint.
pub const BYBIT_WS_URL: &str = "wss://stream.bybit.com/v5/public/linear";

/// Exchange tag used in records and output paths.
pub const EXCHANGE: &str = "bybit-linear";

const FLUSH_INTERVAL_SECS: u64 = 5;
const RECONNECT_DELAY_SECS: u64 = 5;

/// Collector configuration
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Instrument symbols, upper-cased (e.g. BTCUSDT)
    pub symbols: Vec<String>,
    /// Root of the output directory tree
    pub output_dir: PathBuf,
    /// WebSocket endpoint
    pub ws_url: String,
    /// Period between buffer drains
    pub flush_interval: Duration,
    /// Fixed delay between reconnection attempts
    pub reconnect_delay: Duration,
}

impl CollectorConfig {
    /// Build a configuration from a symbol list and output root.
    ///
    /// Symbols are upper-cased for subscription; an empty list is rejected.
    pub fn new(
        symbols: Vec<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let symbols = symbols
            .into_iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();
        if symbols.is_empty() {
            return Err(ConfigError::Invalid("symbols are all blank".to_string()));
        }

        Ok(Self {
            symbols,
            output_dir: output_dir.into(),
            ws_url: BYBIT_WS_URL.to_string(),
            flush_interval: Duration::from_secs(FLUSH_INTERVAL_SECS),
            reconnect_delay: Duration::from_secs(RECONNECT_DELAY_SECS),
        })
    }

    /// Override the WebSocket endpoint (for tests)
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// Override the flush interval (for tests)
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Override the reconnect delay (for tests)
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}
