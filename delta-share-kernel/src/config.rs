//! Sharing configuration.
//!
//! ```json
//! {
//!   "table_root": "s3://bucket/warehouse/orders",
//!   "backend": {
//!     "type": "s3",
//!     "region": "us-east-1",
//!     "access_key_id": {"env_var": "AWS_ACCESS_KEY_ID"},
//!     "secret_access_key": {"env_var": "AWS_SECRET_ACCESS_KEY"}
//!   },
//!   "absolute_paths": "reject",
//!   "max_scan_files": 100000
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::config_value::ConfigValue;
use crate::error::{Result, SharingError};

/// What to do when a table stores absolute data file paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsolutePathPolicy {
    /// Pass absolute paths through unchanged.
    #[default]
    Accept,
    /// Fail with `SharingError::AbsolutePathRejected`.
    Reject,
}

/// S3 backend settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct S3BackendConfig {
    #[serde(default)]
    pub region: Option<ConfigValue>,
    /// Endpoint override (MinIO, LocalStack)
    #[serde(default)]
    pub endpoint: Option<ConfigValue>,
    #[serde(default)]
    pub path_style: bool,
    /// Static credentials; the default AWS chain is used when absent
    #[serde(default)]
    pub access_key_id: Option<ConfigValue>,
    #[serde(default)]
    pub secret_access_key: Option<ConfigValue>,
    #[serde(default)]
    pub session_token: Option<ConfigValue>,
}

/// Storage backend selection.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    S3(S3BackendConfig),
    Local,
    Gcs,
    Azure,
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::S3(_) => "s3",
            BackendConfig::Local => "local",
            BackendConfig::Gcs => "gcs",
            BackendConfig::Azure => "azure",
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::S3(S3BackendConfig::default())
    }
}

fn default_scan_batch_size() -> usize {
    1024
}

fn default_presign_expiry_secs() -> u64 {
    3600
}

/// Configuration for one shared table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SharingConfig {
    /// Table root URI
    pub table_root: ConfigValue,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub absolute_paths: AbsolutePathPolicy,
    /// Fail scans that would materialize more files than this
    #[serde(default)]
    pub max_scan_files: Option<usize>,
    /// Rows per scan-file batch
    #[serde(default = "default_scan_batch_size")]
    pub scan_batch_size: usize,
    /// Lifetime of signed URLs
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
}

impl SharingConfig {
    pub fn new(table_root: impl Into<ConfigValue>) -> Self {
        Self {
            table_root: table_root.into(),
            backend: BackendConfig::default(),
            absolute_paths: AbsolutePathPolicy::default(),
            max_scan_files: None,
            scan_batch_size: default_scan_batch_size(),
            presign_expiry_secs: default_presign_expiry_secs(),
        }
    }

    /// Parse from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SharingError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_absolute_paths(mut self, policy: AbsolutePathPolicy) -> Self {
        self.absolute_paths = policy;
        self
    }

    pub fn with_max_scan_files(mut self, limit: usize) -> Self {
        self.max_scan_files = Some(limit);
        self
    }

    pub fn with_scan_batch_size(mut self, size: usize) -> Self {
        self.scan_batch_size = size;
        self
    }

    pub fn with_presign_expiry_secs(mut self, secs: u64) -> Self {
        self.presign_expiry_secs = secs;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.scan_batch_size == 0 {
            return Err(SharingError::config("scan_batch_size must be at least 1"));
        }
        if self.presign_expiry_secs == 0 {
            return Err(SharingError::config("presign_expiry_secs must be at least 1"));
        }
        Ok(())
    }

    /// Resolved table root URI.
    pub fn resolve_table_root(&self) -> Result<String> {
        let root = self.table_root.resolve()?;
        if root.trim().is_empty() {
            return Err(SharingError::config("table_root is empty"));
        }
        Ok(root)
    }
}
