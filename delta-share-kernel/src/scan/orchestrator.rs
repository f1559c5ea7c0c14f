//! Scan orchestration: latest snapshot, scan state and the full file list.

use std::sync::Arc;

use delta_share_tabular::Row;
use tracing::info;

use super::engine::{ScanBatches, TableEngine};
use crate::error::{Result, SharingError};

/// Everything a client needs to read one snapshot.
#[derive(Debug)]
pub struct ScanStateAndFiles {
    pub version: i64,
    pub scan_state: Box<dyn Row>,
    /// Every scan file row, in engine order
    pub files: Vec<Box<dyn Row>>,
}

/// Runs scans against the latest snapshot of one table.
#[derive(Debug, Clone)]
pub struct ScanOrchestrator {
    table_root: String,
    engine: Arc<dyn TableEngine>,
    max_scan_files: Option<usize>,
}

impl ScanOrchestrator {
    pub fn new(table_root: impl Into<String>, engine: Arc<dyn TableEngine>) -> Self {
        Self {
            table_root: table_root.into(),
            engine,
            max_scan_files: None,
        }
    }

    /// Fail scans with more than `limit` files instead of materializing them.
    pub fn with_max_scan_files(mut self, limit: Option<usize>) -> Self {
        self.max_scan_files = limit;
        self
    }

    pub fn table_root(&self) -> &str {
        &self.table_root
    }

    /// Open the latest snapshot and collect its scan state and every file row.
    ///
    /// The file list is fully materialized; any failure while iterating
    /// discards what was collected so far.
    pub async fn scan_state_and_files(&self) -> Result<ScanStateAndFiles> {
        let snapshot = self.engine.latest_snapshot(&self.table_root).await?;
        let version = snapshot.version();
        let scan = snapshot.scan()?;
        let scan_state = scan.scan_state()?;
        let files = drain_scan_files(scan.scan_files()?, self.max_scan_files)?;

        info!(
            table_root = %self.table_root,
            version,
            files = files.len(),
            "collected scan state and files"
        );

        Ok(ScanStateAndFiles {
            version,
            scan_state,
            files,
        })
    }
}

/// Drain every batch into one list.
///
/// Each batch's row iterator is dropped as soon as it is exhausted. The batch
/// iterator is owned by this call and dropped exactly once on return, whether
/// draining succeeded or failed.
pub fn drain_scan_files(batches: ScanBatches, limit: Option<usize>) -> Result<Vec<Box<dyn Row>>> {
    let mut files = Vec::new();
    for batch in batches {
        let rows = batch?;
        for row in rows {
            let row = row?;
            if let Some(limit) = limit {
                if files.len() >= limit {
                    return Err(SharingError::ScanTooLarge { limit });
                }
            }
            files.push(row);
        }
    }
    Ok(files)
}
