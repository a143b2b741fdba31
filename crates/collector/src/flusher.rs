//! Timer-driven flusher that drains the record buffer to storage.
//!
//! One drain + write cycle per tick. Storage errors propagate out of
//! `run` and take the process down; durability failures must not be
//! masked by the retry machinery that protects the connection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};

use crate::buffer::RecordBuffer;
use crate::error::WriterError;
use crate::metrics;
use crate::writer::PartitionedWriter;

pub struct Flusher {
    buffer: Arc<Mutex<RecordBuffer>>,
    writer: PartitionedWriter,
    flush_interval: Duration,
}

impl Flusher {
    pub fn new(
        buffer: Arc<Mutex<RecordBuffer>>,
        writer: PartitionedWriter,
        flush_interval: Duration,
    ) -> Self {
        Self {
            buffer,
            writer,
            flush_interval,
        }
    }

    /// Drain every pending partition and write the batches out. The buffer
    /// lock is held only for the drain itself, never across file I/O, so
    /// ingestion keeps enqueueing while the writer works.
    pub fn flush_once(&self) -> Result<usize, WriterError> {
        let drained = self.buffer.lock().unwrap().drain_all();
        if drained.is_empty() {
            return Ok(0);
        }

        let mut written = 0;
        for (key, schema, records) in &drained {
            written += self.writer.write_batch(key, *schema, records)?;
            metrics::inc_records_written(key.kind.label(), records.len() as u64);
        }

        debug!(records = written, partitions = drained.len(), "Flushed buffer");
        Ok(written)
    }

    /// Flush on a fixed period until shutdown, then run one final drain so
    /// nothing buffered at interrupt time is lost.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), WriterError> {
        let mut tick = interval(self.flush_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    self.flush_once()?;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Flushing remaining records before exit");
        self.flush_once()?;
        Ok(())
    }
}
