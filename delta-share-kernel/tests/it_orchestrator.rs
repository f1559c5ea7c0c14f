//! Integration tests for scan orchestration and iterator release.
//!
//! Uses an instrumented engine whose batch and row iterators count their own
//! drops, so release on both the success and the failure path is observable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use delta_share_kernel::scan::{ScanBatches, ScanRows};
use delta_share_kernel::{
    Result, ScanOrchestrator, SharingError, TableEngine, TableScan, TableSnapshot,
};
use delta_share_tabular::{DataType, GenericRow, Row, StructField, StructType, Value};

#[derive(Debug, Default)]
struct Counters {
    batch_iterators_dropped: AtomicUsize,
    row_iterators_created: AtomicUsize,
    row_iterators_dropped: AtomicUsize,
}

struct CountingRows {
    ids: std::vec::IntoIter<i64>,
    /// Rows yielded before this iterator fails
    fail_after: Option<usize>,
    yielded: usize,
    counters: Arc<Counters>,
}

impl Iterator for CountingRows {
    type Item = Result<Box<dyn Row>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fail_after == Some(self.yielded) {
            return Some(Err(SharingError::storage("row read failed")));
        }
        self.yielded += 1;
        self.ids.next().map(|id| -> Result<Box<dyn Row>> {
            let schema = Arc::new(StructType::new(vec![StructField::not_null(
                "id",
                DataType::LONG,
            )]));
            let row = GenericRow::try_new(schema, vec![Value::Long(id)])?;
            Ok(Box::new(row))
        })
    }
}

impl Drop for CountingRows {
    fn drop(&mut self) {
        self.counters.row_iterators_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shape of the scan an instrumented engine produces.
#[derive(Debug, Clone)]
struct Plan {
    batches: usize,
    rows_per_batch: usize,
    /// Batch index whose batch iterator step fails
    fail_batch: Option<usize>,
    /// (batch index, row index) at which a row iterator fails
    fail_row: Option<(usize, usize)>,
}

/// Yields the batches of a [`Plan`], failing where it says.
struct CountingBatches {
    next: usize,
    plan: Plan,
    counters: Arc<Counters>,
}

impl Iterator for CountingBatches {
    type Item = Result<ScanRows>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.plan.batches {
            return None;
        }
        let index = self.next;
        self.next += 1;
        if self.plan.fail_batch == Some(index) {
            return Some(Err(SharingError::storage("batch read failed")));
        }
        let size = self.plan.rows_per_batch;
        let start = (index * size) as i64;
        let ids: Vec<i64> = (start..start + size as i64).collect();
        let fail_after = match self.plan.fail_row {
            Some((batch, row)) if batch == index => Some(row),
            _ => None,
        };
        self.counters.row_iterators_created.fetch_add(1, Ordering::SeqCst);
        Some(Ok(Box::new(CountingRows {
            ids: ids.into_iter(),
            fail_after,
            yielded: 0,
            counters: Arc::clone(&self.counters),
        })))
    }
}

impl Drop for CountingBatches {
    fn drop(&mut self) {
        self.counters.batch_iterators_dropped.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct CountingEngine {
    plan: Plan,
    counters: Arc<Counters>,
}

#[derive(Debug)]
struct CountingSnapshot {
    plan: Plan,
    counters: Arc<Counters>,
}

#[async_trait]
impl TableEngine for CountingEngine {
    async fn latest_snapshot(&self, _table_root: &str) -> Result<Box<dyn TableSnapshot>> {
        Ok(Box::new(CountingSnapshot {
            plan: self.plan.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl TableSnapshot for CountingSnapshot {
    fn version(&self) -> i64 {
        7
    }

    fn scan(&self) -> Result<Box<dyn TableScan>> {
        Ok(Box::new(CountingScan {
            plan: self.plan.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

#[derive(Debug)]
struct CountingScan {
    plan: Plan,
    counters: Arc<Counters>,
}

impl TableScan for CountingScan {
    fn scan_state(&self) -> Result<Box<dyn Row>> {
        let schema = Arc::new(StructType::new(vec![StructField::not_null(
            "tablePath",
            DataType::STRING,
        )]));
        Ok(Box::new(GenericRow::try_new(schema, vec!["mem://t".into()])?))
    }

    fn scan_files(&self) -> Result<ScanBatches> {
        Ok(Box::new(CountingBatches {
            next: 0,
            plan: self.plan.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

fn orchestrator_for(plan: Plan) -> (ScanOrchestrator, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let engine = CountingEngine {
        plan,
        counters: Arc::clone(&counters),
    };
    (ScanOrchestrator::new("mem://t", Arc::new(engine)), counters)
}

fn orchestrator(batches: usize, fail_batch: Option<usize>) -> (ScanOrchestrator, Arc<Counters>) {
    orchestrator_for(Plan {
        batches,
        rows_per_batch: 2,
        fail_batch,
        fail_row: None,
    })
}

/// A batch iterator failing on its third batch is released exactly once and
/// leaves no earlier row iterator unreleased.
#[tokio::test]
async fn test_failure_on_third_batch_releases_everything() {
    let (orchestrator, counters) = orchestrator(5, Some(2));

    let err = orchestrator.scan_state_and_files().await.unwrap_err();
    assert!(matches!(err, SharingError::Storage(_)), "{}", err);

    assert_eq!(counters.batch_iterators_dropped.load(Ordering::SeqCst), 1);
    assert_eq!(counters.row_iterators_created.load(Ordering::SeqCst), 2);
    assert_eq!(counters.row_iterators_dropped.load(Ordering::SeqCst), 2);
}

/// The success path drains every batch in order and releases every iterator.
#[tokio::test]
async fn test_success_materializes_all_files() {
    let (orchestrator, counters) = orchestrator(3, None);

    let scan = orchestrator.scan_state_and_files().await.expect("scan");
    assert_eq!(scan.version, 7);
    assert_eq!(scan.scan_state.get_string(0).expect("tablePath"), "mem://t");

    let ids: Vec<i64> = scan
        .files
        .iter()
        .map(|row| row.get_long(0).expect("id"))
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);

    assert_eq!(counters.batch_iterators_dropped.load(Ordering::SeqCst), 1);
    assert_eq!(counters.row_iterators_dropped.load(Ordering::SeqCst), 3);
}

/// The optional cutoff fails the scan instead of returning a partial list.
#[tokio::test]
async fn test_max_scan_files_cutoff() {
    let (orchestrator, counters) = orchestrator(3, None);
    let orchestrator = orchestrator.with_max_scan_files(Some(4));

    let err = orchestrator.scan_state_and_files().await.unwrap_err();
    assert!(matches!(err, SharingError::ScanTooLarge { limit: 4 }));
    assert_eq!(counters.batch_iterators_dropped.load(Ordering::SeqCst), 1);
    assert_eq!(
        counters.row_iterators_dropped.load(Ordering::SeqCst),
        counters.row_iterators_created.load(Ordering::SeqCst)
    );
}

/// A row iterator failing partway through the second batch is released once,
/// as is the batch iterator, and nothing partial is returned.
#[tokio::test]
async fn test_row_failure_mid_batch_releases_everything() {
    let (orchestrator, counters) = orchestrator_for(Plan {
        batches: 4,
        rows_per_batch: 3,
        fail_batch: None,
        fail_row: Some((1, 1)),
    });

    let err = orchestrator.scan_state_and_files().await.unwrap_err();
    assert!(matches!(err, SharingError::Storage(_)), "{}", err);

    assert_eq!(counters.batch_iterators_dropped.load(Ordering::SeqCst), 1);
    assert_eq!(counters.row_iterators_created.load(Ordering::SeqCst), 2);
    assert_eq!(counters.row_iterators_dropped.load(Ordering::SeqCst), 2);
}
