//! A shared table: one table root bound to its storage, scan engine and codec.

use std::sync::Arc;

use delta_share_tabular::Row;

use crate::codec::{JsonRow, RowJsonCodec};
use crate::config::{AbsolutePathPolicy, SharingConfig};
use crate::deletion_vector::DeletionVectorLocator;
use crate::error::{Result, SharingError};
use crate::io::{storage_for_backend, DeltaStorage};
use crate::path::PathResolver;
use crate::scan::{
    DeltaLogEngine, ScanOrchestrator, ScanStateAndFiles, TableEngine, DEFAULT_SCAN_BATCH_SIZE,
};
use crate::signing::{signer_for_backend, UrlSigner};

/// Serialized form of one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedScan {
    pub version: i64,
    pub scan_state: String,
    pub files: Vec<String>,
}

/// Entry point for serving one table.
///
/// Safe to share across tasks; every operation takes `&self`.
#[derive(Debug, Clone)]
pub struct SharedTable {
    orchestrator: ScanOrchestrator,
    codec: RowJsonCodec,
}

impl SharedTable {
    pub fn builder(table_root: impl Into<String>) -> SharedTableBuilder {
        SharedTableBuilder::new(table_root)
    }

    /// Build storage, signer and engine from configuration.
    ///
    /// Fails with [`SharingError::UnsupportedBackend`] when the backend has no
    /// storage or signing support.
    pub async fn from_config(config: &SharingConfig) -> Result<Self> {
        config.validate()?;
        let table_root = config.resolve_table_root()?;
        let storage = storage_for_backend(config).await?;
        let signer = signer_for_backend(config).await?;

        let mut builder = Self::builder(table_root)
            .storage(storage)
            .signer(signer)
            .absolute_paths(config.absolute_paths)
            .scan_batch_size(config.scan_batch_size);
        if let Some(limit) = config.max_scan_files {
            builder = builder.max_scan_files(limit);
        }
        builder.build()
    }

    pub fn table_root(&self) -> &str {
        self.orchestrator.table_root()
    }

    pub fn codec(&self) -> &RowJsonCodec {
        &self.codec
    }

    /// Latest version, scan state and every scan file row.
    pub async fn scan_state_and_files(&self) -> Result<ScanStateAndFiles> {
        self.orchestrator.scan_state_and_files().await
    }

    /// Serialize one row into its self-describing JSON envelope.
    pub async fn serialize(&self, row: &dyn Row) -> Result<String> {
        self.codec.serialize(row).await
    }

    /// Serialize the scan state and every file row of a scan, in order.
    pub async fn serialize_all(&self, scan: &ScanStateAndFiles) -> Result<SerializedScan> {
        let scan_state = self.codec.serialize(scan.scan_state.as_ref()).await?;
        let mut files = Vec::with_capacity(scan.files.len());
        for file in &scan.files {
            files.push(self.codec.serialize(file.as_ref()).await?);
        }
        Ok(SerializedScan {
            version: scan.version,
            scan_state,
            files,
        })
    }

    pub fn deserialize(&self, json: &str) -> Result<JsonRow> {
        self.codec.deserialize(json)
    }
}

/// Builder for [`SharedTable`] with explicit collaborators.
#[derive(Debug)]
pub struct SharedTableBuilder {
    table_root: String,
    storage: Option<Arc<dyn DeltaStorage>>,
    signer: Option<Arc<dyn UrlSigner>>,
    engine: Option<Arc<dyn TableEngine>>,
    absolute_paths: AbsolutePathPolicy,
    max_scan_files: Option<usize>,
    scan_batch_size: usize,
}

impl SharedTableBuilder {
    pub fn new(table_root: impl Into<String>) -> Self {
        Self {
            table_root: table_root.into(),
            storage: None,
            signer: None,
            engine: None,
            absolute_paths: AbsolutePathPolicy::default(),
            max_scan_files: None,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
        }
    }

    /// Storage for the Delta log and deletion-vector lengths.
    pub fn storage(mut self, storage: Arc<dyn DeltaStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn UrlSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Scan engine; defaults to a [`DeltaLogEngine`] over the storage.
    pub fn engine(mut self, engine: Arc<dyn TableEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn absolute_paths(mut self, policy: AbsolutePathPolicy) -> Self {
        self.absolute_paths = policy;
        self
    }

    pub fn max_scan_files(mut self, limit: usize) -> Self {
        self.max_scan_files = Some(limit);
        self
    }

    pub fn scan_batch_size(mut self, size: usize) -> Self {
        self.scan_batch_size = size;
        self
    }

    pub fn build(self) -> Result<SharedTable> {
        if self.table_root.trim().is_empty() {
            return Err(SharingError::config("table root is empty"));
        }
        let storage = self
            .storage
            .ok_or_else(|| SharingError::config("shared table requires a storage backend"))?;
        let signer = self
            .signer
            .ok_or_else(|| SharingError::config("shared table requires a URL signer"))?;
        let engine: Arc<dyn TableEngine> = match self.engine {
            Some(engine) => engine,
            None => Arc::new(
                DeltaLogEngine::new(Arc::clone(&storage)).with_batch_size(self.scan_batch_size),
            ),
        };

        let codec = RowJsonCodec::new(
            self.table_root.clone(),
            PathResolver::new(self.absolute_paths),
            DeletionVectorLocator::new(storage, signer),
        );
        let orchestrator = ScanOrchestrator::new(self.table_root, engine)
            .with_max_scan_files(self.max_scan_files);

        Ok(SharedTable {
            orchestrator,
            codec,
        })
    }
}
