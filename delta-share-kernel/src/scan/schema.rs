//! Schemas and builders for scan state and scan file rows.

use std::sync::Arc;

use delta_share_tabular::{DataType, GenericRow, StructField, StructType, Value};

use crate::error::Result;
use crate::log::{Add, DeletionVectorDescriptor, LogSnapshot};

/// Table-wide scan parameters.
pub fn scan_state_schema() -> StructType {
    StructType::new(vec![
        StructField::not_null("tablePath", DataType::STRING),
        StructField::not_null("minReaderVersion", DataType::INTEGER),
        StructField::not_null("minWriterVersion", DataType::INTEGER),
        StructField::not_null("logicalSchemaString", DataType::STRING),
        StructField::not_null("partitionColumns", DataType::array(DataType::STRING, false)),
        StructField::not_null(
            "configuration",
            DataType::map(DataType::STRING, DataType::STRING, false),
        ),
    ])
}

/// Deletion-vector descriptor nested under `add`.
pub fn deletion_vector_schema() -> StructType {
    StructType::new(vec![
        StructField::not_null("storageType", DataType::STRING),
        StructField::not_null("pathOrInlineDv", DataType::STRING),
        StructField::nullable("offset", DataType::INTEGER),
        StructField::not_null("sizeInBytes", DataType::INTEGER),
        StructField::not_null("cardinality", DataType::LONG),
    ])
}

/// One data file per row.
pub fn scan_file_schema() -> StructType {
    let add = StructType::new(vec![
        StructField::not_null("path", DataType::STRING),
        StructField::not_null(
            "partitionValues",
            DataType::map(DataType::STRING, DataType::STRING, true),
        ),
        StructField::not_null("size", DataType::LONG),
        StructField::not_null("modificationTime", DataType::LONG),
        StructField::not_null("dataChange", DataType::BOOLEAN),
        StructField::nullable(
            "deletionVector",
            DataType::Struct(Box::new(deletion_vector_schema())),
        ),
    ]);
    StructType::new(vec![
        StructField::not_null("add", DataType::Struct(Box::new(add))),
        StructField::not_null("tableRoot", DataType::STRING),
    ])
}

/// Build the scan state row of a snapshot.
pub fn scan_state_row(
    schema: Arc<StructType>,
    table_root: &str,
    snapshot: &LogSnapshot,
) -> Result<GenericRow> {
    let metadata = &snapshot.metadata;
    let row = GenericRow::try_new(
        schema,
        vec![
            Value::String(table_root.to_string()),
            Value::Integer(snapshot.protocol.min_reader_version),
            Value::Integer(snapshot.protocol.min_writer_version),
            Value::String(metadata.schema_string.clone()),
            Value::Array(
                metadata
                    .partition_columns
                    .iter()
                    .map(|c| Value::String(c.clone()))
                    .collect(),
            ),
            Value::Map(
                metadata
                    .configuration
                    .iter()
                    .map(|(k, v)| (Value::String(k.clone()), Value::String(v.clone())))
                    .collect(),
            ),
        ],
    )?;
    Ok(row)
}

/// Build the scan file row of one active file.
pub fn scan_file_row(schema: Arc<StructType>, table_root: &str, add: &Add) -> Result<GenericRow> {
    let partition_values = add
        .partition_values
        .iter()
        .map(|(k, v)| {
            (
                Value::String(k.clone()),
                v.clone().map_or(Value::Null, Value::String),
            )
        })
        .collect();

    let add_value = Value::Struct(vec![
        Value::String(add.path.clone()),
        Value::Map(partition_values),
        Value::Long(add.size),
        Value::Long(add.modification_time),
        Value::Boolean(add.data_change),
        add.deletion_vector
            .as_ref()
            .map_or(Value::Null, deletion_vector_value),
    ]);

    let row = GenericRow::try_new(
        schema,
        vec![add_value, Value::String(table_root.to_string())],
    )?;
    Ok(row)
}

fn deletion_vector_value(dv: &DeletionVectorDescriptor) -> Value {
    Value::Struct(vec![
        Value::String(dv.storage_type.clone()),
        Value::String(dv.path_or_inline_dv.clone()),
        dv.offset.map_or(Value::Null, Value::Integer),
        Value::Integer(dv.size_in_bytes),
        Value::Long(dv.cardinality),
    ])
}
