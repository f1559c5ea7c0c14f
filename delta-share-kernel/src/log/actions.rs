//! Delta log actions.
//!
//! Each commit file is newline-delimited JSON with one action per line, keyed
//! by action name (`{"add": {...}}`). Only the actions that shape the set of
//! active files are modelled; others (`commitInfo`, `txn`, `cdc`, ...) are
//! skipped during parsing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SharingError};

/// Table protocol versions and features.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub min_reader_version: i32,
    pub min_writer_version: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reader_features: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_features: Option<Vec<String>>,
}

/// Data file format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Format {
    pub provider: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for Format {
    fn default() -> Self {
        Self {
            provider: "parquet".to_string(),
            options: BTreeMap::new(),
        }
    }
}

/// Table metadata (`metaData` action).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Format,
    /// Table schema in the Delta schema JSON format
    pub schema_string: String,
    #[serde(default)]
    pub partition_columns: Vec<String>,
    #[serde(default)]
    pub configuration: BTreeMap<String, String>,
    #[serde(default)]
    pub created_time: Option<i64>,
}

/// Deletion vector attached to a data file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionVectorDescriptor {
    /// `u`, `p` or `i`
    pub storage_type: String,
    pub path_or_inline_dv: String,
    /// Byte offset inside the file; absent for inline vectors
    #[serde(default)]
    pub offset: Option<i32>,
    pub size_in_bytes: i32,
    /// Number of deleted rows
    pub cardinality: i64,
}

impl DeletionVectorDescriptor {
    /// Identity of the vector within the log: storage type, reference and
    /// offset (when present).
    pub fn unique_id(&self) -> String {
        match self.offset {
            Some(offset) => format!("{}{}@{}", self.storage_type, self.path_or_inline_dv, offset),
            None => format!("{}{}", self.storage_type, self.path_or_inline_dv),
        }
    }
}

/// A data file added to the table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Add {
    /// URI reference, normally relative to the table root
    pub path: String,
    /// Partition values by column; `None` is a null partition value
    #[serde(default)]
    pub partition_values: BTreeMap<String, Option<String>>,
    pub size: i64,
    pub modification_time: i64,
    pub data_change: bool,
    #[serde(default)]
    pub stats: Option<String>,
    #[serde(default)]
    pub deletion_vector: Option<DeletionVectorDescriptor>,
}

/// A data file removed from the table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Remove {
    pub path: String,
    #[serde(default)]
    pub deletion_timestamp: Option<i64>,
    #[serde(default = "default_data_change")]
    pub data_change: bool,
    #[serde(default)]
    pub deletion_vector: Option<DeletionVectorDescriptor>,
}

fn default_data_change() -> bool {
    true
}

/// Key of a logical file: path plus deletion-vector identity.
pub type FileKey = (String, Option<String>);

impl Add {
    pub fn key(&self) -> FileKey {
        (
            self.path.clone(),
            self.deletion_vector.as_ref().map(|dv| dv.unique_id()),
        )
    }
}

impl Remove {
    pub fn key(&self) -> FileKey {
        (
            self.path.clone(),
            self.deletion_vector.as_ref().map(|dv| dv.unique_id()),
        )
    }
}

/// A replay-relevant action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Protocol(Protocol),
    Metadata(Metadata),
    Add(Add),
    Remove(Remove),
}

// One line of a commit file. Unknown action keys are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionLine {
    #[serde(default)]
    protocol: Option<Protocol>,
    #[serde(default)]
    meta_data: Option<Metadata>,
    #[serde(default)]
    add: Option<Add>,
    #[serde(default)]
    remove: Option<Remove>,
}

/// Parse the actions of one commit file.
///
/// `source` names the file in error messages.
pub fn parse_commit(source: &str, content: &[u8]) -> Result<Vec<Action>> {
    let text = std::str::from_utf8(content)
        .map_err(|e| SharingError::log(format!("{} is not UTF-8: {}", source, e)))?;

    let mut actions = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ActionLine = serde_json::from_str(line).map_err(|e| {
            SharingError::log(format!("{} line {}: invalid action: {}", source, index + 1, e))
        })?;

        if let Some(protocol) = parsed.protocol {
            actions.push(Action::Protocol(protocol));
        }
        if let Some(metadata) = parsed.meta_data {
            actions.push(Action::Metadata(metadata));
        }
        if let Some(add) = parsed.add {
            actions.push(Action::Add(add));
        }
        if let Some(remove) = parsed.remove {
            actions.push(Action::Remove(remove));
        }
    }
    Ok(actions)
}
