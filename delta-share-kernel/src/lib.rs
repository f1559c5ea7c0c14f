//! Delta Sharing scan serialization.
//!
//! This crate turns the latest snapshot of a Delta table into self-describing
//! JSON rows a remote sharing client can consume without the table metadata
//! engine: one scan state row plus one row per data file, with relative file
//! paths resolved and deletion vectors turned into signed URLs.
//!
//! # Features
//!
//! - `native` (default) - Local filesystem storage through `tokio::fs`
//! - `aws` - S3 storage and S3 presigned URL signing
//!
//! # Architecture
//!
//! - [`config`] - Per-table configuration (backend, path policy, scan limits)
//! - [`io`] - Storage abstraction (memory, local, S3)
//! - [`path`] - Path Resolver for table-relative file references
//! - [`deletion_vector`] - Z85 references and the Deletion-Vector Locator
//! - [`signing`] - URL signers per backend
//! - [`codec`] - Row ⇄ JSON codec with reserved-column rewriting
//! - [`log`] - Delta log actions and replay
//! - [`scan`] - Scan engine seam, Delta log engine and Scan Orchestrator
//! - [`table`] - `SharedTable`, tying the above to one table root
//!
//! # Example
//!
//! ```ignore
//! use delta_share_kernel::{SharedTable, SharingConfig};
//!
//! let config = SharingConfig::from_json_str(r#"{
//!     "table_root": "s3://bucket/warehouse/orders",
//!     "backend": {"type": "s3", "region": "us-east-1"}
//! }"#)?;
//! let table = SharedTable::from_config(&config).await?;
//!
//! let scan = table.scan_state_and_files().await?;
//! let payload = table.serialize_all(&scan).await?;
//! println!("version {}: {} files", payload.version, payload.files.len());
//! ```

pub mod codec;
pub mod config;
pub mod config_value;
pub mod deletion_vector;
pub mod error;
pub mod io;
pub mod log;
pub mod path;
pub mod scan;
pub mod signing;
pub mod table;

pub use codec::{deserialize, JsonRow, ReservedColumn, RowJsonCodec};
pub use config::{AbsolutePathPolicy, BackendConfig, S3BackendConfig, SharingConfig};
pub use config_value::ConfigValue;
pub use deletion_vector::DeletionVectorLocator;
pub use error::{Result, SharingError};
pub use io::{DeltaStorage, MemoryStorage};
pub use path::PathResolver;
pub use scan::{
    DeltaLogEngine, ScanOrchestrator, ScanStateAndFiles, TableEngine, TableScan, TableSnapshot,
};
pub use signing::{signer_for_backend, UrlSigner};
pub use table::{SerializedScan, SharedTable, SharedTableBuilder};

#[cfg(feature = "native")]
pub use io::LocalFileStorage;

#[cfg(feature = "aws")]
pub use io::S3DeltaStorage;
#[cfg(feature = "aws")]
pub use signing::S3UrlSigner;
