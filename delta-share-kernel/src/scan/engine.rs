//! Table scan engine seam and the built-in Delta log engine.
//!
//! An engine opens the latest snapshot of a table; a snapshot builds a scan;
//! a scan yields its state row and an iterator of file-row batches. Only
//! opening the snapshot performs I/O, so iteration is synchronous.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use delta_share_tabular::{Row, RowBatch};

use super::schema::{scan_file_row, scan_file_schema, scan_state_row, scan_state_schema};
use crate::error::Result;
use crate::io::DeltaStorage;
use crate::log::{replay_latest, LogSnapshot};

/// Rows of one batch.
pub type ScanRows = Box<dyn Iterator<Item = Result<Box<dyn Row>>> + Send>;

/// Batches of scan file rows. Each item is the row iterator of one batch.
pub type ScanBatches = Box<dyn Iterator<Item = Result<ScanRows>> + Send>;

/// Default rows per scan file batch.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 1024;

/// Opens table snapshots.
#[async_trait]
pub trait TableEngine: Debug + Send + Sync {
    /// Resolve the latest snapshot of the table at `table_root`.
    async fn latest_snapshot(&self, table_root: &str) -> Result<Box<dyn TableSnapshot>>;
}

/// One version of a table.
pub trait TableSnapshot: Debug + Send + Sync {
    /// Monotonically increasing version identifier.
    fn version(&self) -> i64;

    /// Build a scan over every file of this snapshot.
    fn scan(&self) -> Result<Box<dyn TableScan>>;
}

/// A scan over one snapshot.
pub trait TableScan: Debug + Send {
    /// Table-wide parameters for reading the scan files.
    fn scan_state(&self) -> Result<Box<dyn Row>>;

    /// The files to read, in batches.
    fn scan_files(&self) -> Result<ScanBatches>;
}

/// Engine backed by replaying `_delta_log` commits through a [`DeltaStorage`].
#[derive(Debug, Clone)]
pub struct DeltaLogEngine {
    storage: Arc<dyn DeltaStorage>,
    batch_size: usize,
}

impl DeltaLogEngine {
    pub fn new(storage: Arc<dyn DeltaStorage>) -> Self {
        Self {
            storage,
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
        }
    }

    /// Set the rows per scan file batch (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait]
impl TableEngine for DeltaLogEngine {
    async fn latest_snapshot(&self, table_root: &str) -> Result<Box<dyn TableSnapshot>> {
        let snapshot = replay_latest(self.storage.as_ref(), table_root).await?;
        Ok(Box::new(DeltaSnapshot {
            table_root: table_root.to_string(),
            snapshot: Arc::new(snapshot),
            batch_size: self.batch_size,
        }))
    }
}

#[derive(Debug)]
struct DeltaSnapshot {
    table_root: String,
    snapshot: Arc<LogSnapshot>,
    batch_size: usize,
}

impl TableSnapshot for DeltaSnapshot {
    fn version(&self) -> i64 {
        self.snapshot.version
    }

    fn scan(&self) -> Result<Box<dyn TableScan>> {
        Ok(Box::new(DeltaScan {
            table_root: self.table_root.clone(),
            snapshot: Arc::clone(&self.snapshot),
            batch_size: self.batch_size,
        }))
    }
}

#[derive(Debug)]
struct DeltaScan {
    table_root: String,
    snapshot: Arc<LogSnapshot>,
    batch_size: usize,
}

impl TableScan for DeltaScan {
    fn scan_state(&self) -> Result<Box<dyn Row>> {
        let row = scan_state_row(Arc::new(scan_state_schema()), &self.table_root, &self.snapshot)?;
        Ok(Box::new(row))
    }

    fn scan_files(&self) -> Result<ScanBatches> {
        let schema = Arc::new(scan_file_schema());
        let snapshot = Arc::clone(&self.snapshot);
        let table_root = self.table_root.clone();
        let batch_size = self.batch_size;
        let total = snapshot.files.len();

        // Rows are built batch by batch as the iterator advances
        let batches = (0..total).step_by(batch_size).map(move |start| -> Result<ScanRows> {
            let end = (start + batch_size).min(total);
            let rows = snapshot.files[start..end]
                .iter()
                .map(|add| scan_file_row(Arc::clone(&schema), &table_root, add))
                .collect::<Result<Vec<_>>>()?;
            let batch = RowBatch::new(Arc::clone(&schema), rows)?;
            tracing::debug!(start, rows = batch.num_rows(), "built scan file batch");
            Ok(batch_rows(batch))
        });
        Ok(Box::new(batches))
    }
}

/// Row iterator over an owned batch.
pub fn batch_rows(batch: RowBatch) -> ScanRows {
    Box::new(
        batch
            .into_rows()
            .map(|row| -> Result<Box<dyn Row>> { Ok(Box::new(row)) }),
    )
}
