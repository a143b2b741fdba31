//! Writes drained record batches to partitioned gzip CSV files.
//!
//! Each append opens a new gzip member on the existing file, so readers
//! must use a multi-member decoder (gunzip and `MultiGzDecoder` both do).

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::buffer::Schema;
use crate::error::WriterError;
use crate::partition::PartitionKey;
use crate::record::Record;

/// Appends record batches to the partition's file, creating directories
/// and writing the header exactly once per file's lifetime. Holds no state
/// between batches; the header-once invariant rests on the file existence
/// check, which also covers restarts onto an existing output tree.
pub struct PartitionedWriter {
    root: PathBuf,
}

impl PartitionedWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Append one drained batch. Returns the number of records written.
    pub fn write_batch(
        &self,
        key: &PartitionKey,
        schema: Schema,
        records: &[Record],
    ) -> Result<usize, WriterError> {
        if records.is_empty() {
            return Ok(0);
        }

        let path = key.path(&self.root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Existence must be checked before the open below creates the file.
        let header_needed = !path.exists();

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut encoder = GzEncoder::new(file, Compression::default());

        if header_needed {
            writeln!(encoder, "{}", schema.join(","))?;
        }
        for record in records {
            record.write_csv_row(&mut encoder)?;
        }
        encoder.finish()?;

        debug!(path = %path.display(), records = records.len(), header = header_needed, "Wrote batch");
        Ok(records.len())
    }
}
