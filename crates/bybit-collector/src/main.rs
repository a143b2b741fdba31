//! bybit-collector: Bybit linear market data collection binary
//!
//! Streams trades and top-of-book quotes for the given symbols and writes
//! them to date- and instrument-partitioned gzip CSV files.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bybit_collector_lib::{
    BybitConnector, CollectorConfig, Flusher, PartitionedWriter, RecordBuffer,
};

#[derive(Parser, Debug)]
#[command(name = "bybit-collector")]
#[command(about = "Bybit linear market data collector (quotes + trades)")]
struct Args {
    /// Instrument symbols, e.g. BTCUSDT ETHUSDT
    #[arg(required = true)]
    symbols: Vec<String>,

    /// Root output directory
    #[arg(long, default_value = "./data")]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = CollectorConfig::new(args.symbols, args.output_dir)?;

    info!(
        symbols = ?config.symbols,
        output_dir = %config.output_dir.display(),
        flush_interval_secs = config.flush_interval.as_secs(),
        "Starting collector"
    );

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    // The buffer is the only state shared between the two tasks.
    let buffer = Arc::new(Mutex::new(RecordBuffer::new()));
    let flusher = Flusher::new(
        Arc::clone(&buffer),
        PartitionedWriter::new(config.output_dir.clone()),
        config.flush_interval,
    );

    let mut connector = BybitConnector::new(&config, Arc::clone(&buffer));
    let connector_rx = shutdown_rx.clone();
    let connector_handle = tokio::spawn(async move {
        connector.run(connector_rx).await;
    });

    // Storage failures are fatal; reconnection only protects the feed side.
    if let Err(e) = flusher.run(shutdown_rx).await {
        error!(error = %e, "Storage failure, exiting");
        std::process::exit(1);
    }

    connector_handle.await?;

    // The connector may have enqueued a few last records while closing;
    // pick them up before exit.
    if let Err(e) = flusher.flush_once() {
        error!(error = %e, "Final flush failed");
        std::process::exit(1);
    }

    info!("Collector stopped gracefully");
    Ok(())
}
