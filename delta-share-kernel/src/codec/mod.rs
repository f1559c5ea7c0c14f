//! Row ⇄ JSON codec for scan state and scan file rows.
//!
//! A serialized row is a two-key envelope carrying its own schema, so it can be
//! decoded without the scan session that produced it:
//!
//! ```json
//! {"schema": "{\"type\":\"struct\",\"fields\":[...]}", "row": {"add": {...}, "tableRoot": "..."}}
//! ```
//!
//! Encoding walks the schema generically. Exactly three column paths are
//! rewritten instead of copied; see [`ReservedColumn`].

mod encode;
mod json_row;

pub use encode::RowJsonCodec;
pub use json_row::{deserialize, JsonRow};

/// Envelope key holding the schema JSON text.
pub const SCHEMA_KEY: &str = "schema";
/// Envelope key holding the row object.
pub const ROW_KEY: &str = "row";

/// Relative data file path; replaced by the resolved absolute path.
pub const FILE_PATH_COLUMN: &[&str] = &["add", "path"];
/// Deletion-vector reference; replaced by the signed sharing URL.
pub const DV_PATH_COLUMN: &[&str] = &["add", "deletionVector", "pathOrInlineDv"];
/// Deletion-vector storage type; always replaced by `"p"`.
pub const DV_STORAGE_TYPE_COLUMN: &[&str] = &["add", "deletionVector", "storageType"];

/// Columns whose string values are encoded storage locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedColumn {
    FilePath,
    DeletionVectorPath,
    DeletionVectorStorageType,
}

impl ReservedColumn {
    /// Match the column at `prefix + name` against the reserved paths.
    pub fn lookup(prefix: &[String], name: &str) -> Option<Self> {
        [
            (FILE_PATH_COLUMN, ReservedColumn::FilePath),
            (DV_PATH_COLUMN, ReservedColumn::DeletionVectorPath),
            (DV_STORAGE_TYPE_COLUMN, ReservedColumn::DeletionVectorStorageType),
        ]
        .into_iter()
        .find(|(path, _)| path_equals(path, prefix, name))
        .map(|(_, column)| column)
    }
}

fn path_equals(path: &[&str], prefix: &[String], name: &str) -> bool {
    match path.split_last() {
        Some((last, parents)) => {
            *last == name
                && parents.len() == prefix.len()
                && parents.iter().zip(prefix).all(|(a, b)| *a == b.as_str())
        }
        None => false,
    }
}
