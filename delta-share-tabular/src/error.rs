//! Error types for tabular operations.

use thiserror::Error;

/// Errors from row and schema operations.
#[derive(Debug, Error)]
pub enum TabularError {
    /// Schema or structural error (field count mismatch, value/type mismatch, etc.)
    #[error("Schema error: {0}")]
    Schema(String),

    /// A row accessor was called with an ordinal or type that does not match the row
    #[error("Type mismatch at ordinal {ordinal}: {message}")]
    TypeMismatch { ordinal: usize, message: String },

    /// Schema JSON could not be produced or parsed
    #[error("Schema JSON error: {0}")]
    SchemaJson(String),
}

impl TabularError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn type_mismatch(ordinal: usize, msg: impl Into<String>) -> Self {
        Self::TypeMismatch {
            ordinal,
            message: msg.into(),
        }
    }
}

/// Result type for tabular operations.
pub type Result<T> = std::result::Result<T, TabularError>;
