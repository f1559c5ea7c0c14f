//! Row to JSON encoding with storage-location rewriting.

use futures::future::BoxFuture;
use serde_json::{Map, Number, Value as JsonValue};

use delta_share_tabular::{DataType, PrimitiveType, Row, StructType, Value};

use super::{json_row, JsonRow, ReservedColumn, ROW_KEY, SCHEMA_KEY};
use crate::deletion_vector::{DeletionVectorLocator, STORAGE_TYPE_PATH};
use crate::error::{Result, SharingError};
use crate::path::PathResolver;

/// Serializes scan rows for one table, rewriting file and deletion-vector
/// locations into client-usable form.
#[derive(Debug, Clone)]
pub struct RowJsonCodec {
    table_root: String,
    resolver: PathResolver,
    locator: DeletionVectorLocator,
}

impl RowJsonCodec {
    pub fn new(
        table_root: impl Into<String>,
        resolver: PathResolver,
        locator: DeletionVectorLocator,
    ) -> Self {
        Self {
            table_root: table_root.into(),
            resolver,
            locator,
        }
    }

    pub fn table_root(&self) -> &str {
        &self.table_root
    }

    /// Serialize a row into the self-describing `{"schema", "row"}` envelope.
    pub async fn serialize(&self, row: &dyn Row) -> Result<String> {
        let schema = row.schema().to_json().map_err(|e| {
            SharingError::json_encode(format!("Failed to serialize row schema: {}", e))
        })?;
        let object = self.to_json(row, &[]).await?;

        let mut envelope = Map::with_capacity(2);
        envelope.insert(SCHEMA_KEY.to_string(), JsonValue::String(schema));
        envelope.insert(ROW_KEY.to_string(), JsonValue::Object(object));

        serde_json::to_string(&JsonValue::Object(envelope))
            .map_err(|e| SharingError::json_encode(format!("Failed to write row JSON: {}", e)))
    }

    /// Parse an envelope produced by [`RowJsonCodec::serialize`].
    pub fn deserialize(&self, json: &str) -> Result<JsonRow> {
        json_row::deserialize(json)
    }

    /// Encode a row as a JSON object keyed by field name.
    ///
    /// `prefix` is the field-name path from the top-level row to `row`.
    /// Null fields are written as explicit nulls, never omitted.
    pub fn to_json<'a>(
        &'a self,
        row: &'a dyn Row,
        prefix: &'a [String],
    ) -> BoxFuture<'a, Result<Map<String, JsonValue>>> {
        Box::pin(async move {
            let schema = row.schema();
            let mut object = Map::with_capacity(schema.len());

            for (ordinal, field) in schema.fields.iter().enumerate() {
                let value = if row.is_null_at(ordinal) {
                    JsonValue::Null
                } else {
                    match &field.data_type {
                        DataType::Primitive(PrimitiveType::String) => {
                            self.encode_string(row, ordinal, prefix, &field.name)
                                .await?
                        }
                        DataType::Struct(_) => {
                            let child = row.get_struct(ordinal)?;
                            let mut child_prefix = prefix.to_vec();
                            child_prefix.push(field.name.clone());
                            JsonValue::Object(self.to_json(child.as_ref(), &child_prefix).await?)
                        }
                        data_type => encode_field(row, ordinal, &field.name, data_type)?,
                    }
                };
                object.insert(field.name.clone(), value);
            }

            Ok(object)
        })
    }

    async fn encode_string(
        &self,
        row: &dyn Row,
        ordinal: usize,
        prefix: &[String],
        name: &str,
    ) -> Result<JsonValue> {
        let raw = row.get_string(ordinal)?;
        let encoded = match ReservedColumn::lookup(prefix, name) {
            None => raw.to_string(),
            Some(ReservedColumn::FilePath) => self.resolver.resolve(&self.table_root, raw)?,
            Some(ReservedColumn::DeletionVectorPath) => {
                let storage_type = sibling_string(row, "storageType")?;
                self.locator
                    .locate(&self.table_root, storage_type, raw)
                    .await?
            }
            // The sibling reference is always rewritten to a full URL
            Some(ReservedColumn::DeletionVectorStorageType) => STORAGE_TYPE_PATH.to_string(),
        };
        Ok(JsonValue::String(encoded))
    }
}

fn sibling_string<'r>(row: &'r dyn Row, name: &str) -> Result<Option<&'r str>> {
    match row.schema().index_of(name) {
        Some(ordinal) if !row.is_null_at(ordinal) => Ok(Some(row.get_string(ordinal)?)),
        _ => Ok(None),
    }
}

/// Encode a non-string, non-struct field.
fn encode_field(
    row: &dyn Row,
    ordinal: usize,
    name: &str,
    data_type: &DataType,
) -> Result<JsonValue> {
    let value = match data_type {
        DataType::Primitive(PrimitiveType::Boolean) => JsonValue::Bool(row.get_boolean(ordinal)?),
        DataType::Primitive(PrimitiveType::Byte) => JsonValue::from(row.get_byte(ordinal)?),
        DataType::Primitive(PrimitiveType::Short) => JsonValue::from(row.get_short(ordinal)?),
        DataType::Primitive(PrimitiveType::Integer) => JsonValue::from(row.get_int(ordinal)?),
        DataType::Primitive(PrimitiveType::Long) => JsonValue::from(row.get_long(ordinal)?),
        DataType::Primitive(PrimitiveType::Float) => float_json(row.get_float(ordinal)?)?,
        DataType::Primitive(PrimitiveType::Double) => double_json(row.get_double(ordinal)?)?,
        DataType::Array(array) => {
            let items = row.get_array(ordinal)?;
            array_json(&items, &array.element_type)?
        }
        DataType::Map(map) => {
            let entries = row.get_map(ordinal)?;
            map_json(&entries, &map.key_type, &map.value_type)?
        }
        other => {
            return Err(SharingError::unsupported_type(format!(
                "{} (field '{}')",
                other, name
            )))
        }
    };
    Ok(value)
}

/// Encode an owned value of the given type. Used for array elements and map
/// entries, which carry no storage locations.
fn value_json(value: &Value, data_type: &DataType) -> Result<JsonValue> {
    let json = match (value, data_type) {
        (Value::Null, _) => JsonValue::Null,
        (Value::Boolean(v), DataType::Primitive(PrimitiveType::Boolean)) => JsonValue::Bool(*v),
        (Value::Byte(v), DataType::Primitive(PrimitiveType::Byte)) => JsonValue::from(*v),
        (Value::Short(v), DataType::Primitive(PrimitiveType::Short)) => JsonValue::from(*v),
        (Value::Integer(v), DataType::Primitive(PrimitiveType::Integer)) => JsonValue::from(*v),
        (Value::Long(v), DataType::Primitive(PrimitiveType::Long)) => JsonValue::from(*v),
        (Value::Float(v), DataType::Primitive(PrimitiveType::Float)) => float_json(*v)?,
        (Value::Double(v), DataType::Primitive(PrimitiveType::Double)) => double_json(*v)?,
        (Value::String(v), DataType::Primitive(PrimitiveType::String)) => {
            JsonValue::String(v.clone())
        }
        (Value::Array(items), DataType::Array(array)) => array_json(items, &array.element_type)?,
        (Value::Map(entries), DataType::Map(map)) => {
            map_json(entries, &map.key_type, &map.value_type)?
        }
        (Value::Struct(values), DataType::Struct(st)) => struct_json(values, st)?,
        (_, DataType::Primitive(p)) if !is_json_primitive(p) => {
            return Err(SharingError::unsupported_type(p.to_string()))
        }
        (value, data_type) => {
            return Err(SharingError::json_encode(format!(
                "{} value does not match declared type {}",
                value.kind(),
                data_type
            )))
        }
    };
    Ok(json)
}

fn is_json_primitive(p: &PrimitiveType) -> bool {
    !matches!(
        p,
        PrimitiveType::Binary
            | PrimitiveType::Date
            | PrimitiveType::Timestamp
            | PrimitiveType::Decimal { .. }
    )
}

fn array_json(items: &[Value], element_type: &DataType) -> Result<JsonValue> {
    items
        .iter()
        .map(|item| value_json(item, element_type))
        .collect::<Result<Vec<_>>>()
        .map(JsonValue::Array)
}

/// String-keyed maps become objects; any other key type becomes an array of
/// `[key, value]` pairs.
fn map_json(entries: &[(Value, Value)], key_type: &DataType, value_type: &DataType) -> Result<JsonValue> {
    if *key_type == DataType::STRING {
        let mut object = Map::with_capacity(entries.len());
        for (key, value) in entries {
            let key = match key {
                Value::String(k) => k.clone(),
                other => {
                    return Err(SharingError::json_encode(format!(
                        "map key must be a non-null string, found {}",
                        other.kind()
                    )))
                }
            };
            // An object cannot hold a key twice
            if object.contains_key(&key) {
                return Err(SharingError::json_encode(format!(
                    "duplicate map key {:?}",
                    key
                )));
            }
            object.insert(key, value_json(value, value_type)?);
        }
        return Ok(JsonValue::Object(object));
    }

    entries
        .iter()
        .map(|(key, value)| {
            Ok(JsonValue::Array(vec![
                value_json(key, key_type)?,
                value_json(value, value_type)?,
            ]))
        })
        .collect::<Result<Vec<_>>>()
        .map(JsonValue::Array)
}

fn struct_json(values: &[Value], schema: &StructType) -> Result<JsonValue> {
    if values.len() != schema.len() {
        return Err(SharingError::json_encode(format!(
            "struct value has {} fields, schema has {}",
            values.len(),
            schema.len()
        )));
    }
    let mut object = Map::with_capacity(values.len());
    for (field, value) in schema.fields.iter().zip(values) {
        object.insert(field.name.clone(), value_json(value, &field.data_type)?);
    }
    Ok(JsonValue::Object(object))
}

fn float_json(v: f32) -> Result<JsonValue> {
    // Go through the shortest decimal form so 1.1f32 is written as 1.1
    let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(v));
    finite_number(widened, "float")
}

fn double_json(v: f64) -> Result<JsonValue> {
    finite_number(v, "double")
}

fn finite_number(v: f64, kind: &str) -> Result<JsonValue> {
    Number::from_f64(v)
        .map(JsonValue::Number)
        .ok_or_else(|| SharingError::json_encode(format!("non-finite {} value {}", kind, v)))
}
