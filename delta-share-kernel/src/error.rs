//! Error types for sharing-kernel operations.

use thiserror::Error;

/// Errors from scan orchestration and row serialization.
#[derive(Debug, Error)]
pub enum SharingError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The storage backend has no URL-signing support
    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),

    /// A schema type has no JSON mapping
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Storage/IO error
    #[error("Storage error: {0}")]
    Storage(String),

    /// File or object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Could not produce JSON
    #[error("JSON encoding error: {0}")]
    JsonEncode(String),

    /// Could not parse JSON
    #[error("JSON decoding error: {0}")]
    JsonDecode(String),

    /// Row or schema structure error
    #[error("Schema error: {0}")]
    Schema(String),

    /// A storage path could not be parsed or joined
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The table stores an absolute file path and the policy rejects it
    #[error("Absolute path rejected: {0}")]
    AbsolutePathRejected(String),

    /// Malformed or unsupported deletion vector reference
    #[error("Deletion vector error: {0}")]
    DeletionVector(String),

    /// URL signing failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Malformed Delta log
    #[error("Delta log error: {0}")]
    Log(String),

    /// Table has no readable snapshot
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),

    /// Scan produced more files than the configured cutoff
    #[error("Scan exceeds {limit} files")]
    ScanTooLarge { limit: usize },
}

impl SharingError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unsupported_backend(msg: impl Into<String>) -> Self {
        Self::UnsupportedBackend(msg.into())
    }

    pub fn unsupported_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn json_encode(msg: impl Into<String>) -> Self {
        Self::JsonEncode(msg.into())
    }

    pub fn json_decode(msg: impl Into<String>) -> Self {
        Self::JsonDecode(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub fn deletion_vector(msg: impl Into<String>) -> Self {
        Self::DeletionVector(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    pub fn log(msg: impl Into<String>) -> Self {
        Self::Log(msg.into())
    }

    /// Whether this is one of the JSON encode/decode kinds.
    pub fn is_json(&self) -> bool {
        matches!(self, Self::JsonEncode(_) | Self::JsonDecode(_))
    }
}

/// Result type for sharing-kernel operations.
pub type Result<T> = std::result::Result<T, SharingError>;

// Integration with tabular errors
impl From<delta_share_tabular::TabularError> for SharingError {
    fn from(err: delta_share_tabular::TabularError) -> Self {
        match err {
            delta_share_tabular::TabularError::SchemaJson(msg) => SharingError::JsonDecode(msg),
            other => SharingError::Schema(other.to_string()),
        }
    }
}
