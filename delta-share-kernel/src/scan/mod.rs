//! Scans over the latest table snapshot.
//!
//! - [`engine`] - the snapshot/scan seam and the built-in Delta log engine
//! - [`schema`] - scan state and scan file row layouts
//! - [`orchestrator`] - collects version, scan state and every file row

pub mod engine;
pub mod orchestrator;
pub mod schema;

pub use engine::{
    batch_rows, DeltaLogEngine, ScanBatches, ScanRows, TableEngine, TableScan, TableSnapshot,
    DEFAULT_SCAN_BATCH_SIZE,
};
pub use orchestrator::{drain_scan_files, ScanOrchestrator, ScanStateAndFiles};
pub use schema::{scan_file_schema, scan_state_schema};
