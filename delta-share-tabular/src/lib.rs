//! Row and schema model for Delta Sharing scan payloads.
//!
//! This crate provides the typed row abstraction consumed by the sharing kernel:
//! schemas that round-trip through Delta's schema JSON format, an owned row type,
//! and batches of rows produced by a scan engine.
//!
//! # Design
//!
//! - **Closed type set**: `DataType` is a finite enum, so every consumer matches exhaustively
//! - **Ordinal access**: Row values are addressed by schema ordinal, never by name
//! - **Lazy accessors**: `Row` accessors return `Result`, so a row backed by untrusted
//!   data fails when a field is read with the wrong type rather than at construction

pub mod batch;
pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use batch::RowBatch;
pub use error::{Result, TabularError};
pub use row::{read_value, GenericRow, Row};
pub use types::{ArrayType, DataType, MapType, PrimitiveType, StructField, StructType};
pub use value::Value;
