//! Storage backends for Delta table files.

pub mod storage;

use std::sync::Arc;

use crate::config::{BackendConfig, SharingConfig};
use crate::error::{Result, SharingError};

pub use storage::{parse_s3_uri, DeltaStorage, MemoryStorage};

#[cfg(feature = "native")]
pub use storage::LocalFileStorage;

#[cfg(feature = "aws")]
pub use storage::{build_s3_client, S3DeltaStorage};

/// Build the storage for the configured backend.
///
/// GCS and Azure have no storage implementation; S3 needs the `aws`
/// feature and local files the `native` feature.
pub async fn storage_for_backend(config: &SharingConfig) -> Result<Arc<dyn DeltaStorage>> {
    match &config.backend {
        #[cfg(feature = "aws")]
        BackendConfig::S3(s3) => Ok(Arc::new(S3DeltaStorage::from_config(s3).await?)),
        #[cfg(feature = "native")]
        BackendConfig::Local => Ok(Arc::new(LocalFileStorage::new())),
        other => Err(SharingError::unsupported_backend(format!(
            "{} storage is not available in this build",
            other.name()
        ))),
    }
}
