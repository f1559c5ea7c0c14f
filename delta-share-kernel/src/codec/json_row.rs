//! Decoding of serialized row envelopes.

use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

use delta_share_tabular::{DataType, PrimitiveType, Row, StructType, TabularError, Value};

use super::{ROW_KEY, SCHEMA_KEY};
use crate::error::{Result, SharingError};

/// Parse a `{"schema", "row"}` envelope into a row view.
///
/// The schema may be embedded either as JSON text or as a nested object.
/// Field values are not checked here; a value that does not match its
/// declared type fails when it is read.
pub fn deserialize(json: &str) -> Result<JsonRow> {
    let envelope: JsonValue = serde_json::from_str(json)
        .map_err(|e| SharingError::json_decode(format!("Invalid row JSON: {}", e)))?;

    let mut envelope = match envelope {
        JsonValue::Object(map) => map,
        other => {
            return Err(SharingError::json_decode(format!(
                "row envelope must be an object, found {}",
                json_kind(&other)
            )))
        }
    };

    let schema = match envelope.remove(SCHEMA_KEY) {
        Some(JsonValue::String(text)) => StructType::from_json(&text)?,
        Some(value @ JsonValue::Object(_)) => StructType::from_json_value(value)?,
        Some(other) => {
            return Err(SharingError::json_decode(format!(
                "'{}' must be schema JSON text, found {}",
                SCHEMA_KEY,
                json_kind(&other)
            )))
        }
        None => {
            return Err(SharingError::json_decode(format!(
                "row envelope is missing '{}'",
                SCHEMA_KEY
            )))
        }
    };

    let values = match envelope.remove(ROW_KEY) {
        Some(JsonValue::Object(map)) => map,
        Some(other) => {
            return Err(SharingError::json_decode(format!(
                "'{}' must be an object, found {}",
                ROW_KEY,
                json_kind(&other)
            )))
        }
        None => {
            return Err(SharingError::json_decode(format!(
                "row envelope is missing '{}'",
                ROW_KEY
            )))
        }
    };

    Ok(JsonRow::new(Arc::new(schema), values))
}

/// A row backed by a JSON object, read lazily through its schema.
///
/// Fields absent from the object read as null.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRow {
    schema: Arc<StructType>,
    values: Map<String, JsonValue>,
}

impl JsonRow {
    pub fn new(schema: Arc<StructType>, values: Map<String, JsonValue>) -> Self {
        Self { schema, values }
    }

    pub fn schema_ref(&self) -> &Arc<StructType> {
        &self.schema
    }

    /// The underlying JSON object.
    pub fn json(&self) -> &Map<String, JsonValue> {
        &self.values
    }

    fn raw(&self, ordinal: usize) -> Option<&JsonValue> {
        self.schema
            .field_at(ordinal)
            .and_then(|field| self.values.get(&field.name))
    }

    fn checked(&self, ordinal: usize) -> delta_share_tabular::Result<&JsonValue> {
        if ordinal >= self.schema.len() {
            return Err(TabularError::type_mismatch(
                ordinal,
                format!("ordinal out of range for {} fields", self.schema.len()),
            ));
        }
        match self.raw(ordinal) {
            None | Some(JsonValue::Null) => {
                Err(TabularError::type_mismatch(ordinal, "value is null"))
            }
            Some(value) => Ok(value),
        }
    }

    fn field_type(&self, ordinal: usize) -> delta_share_tabular::Result<&DataType> {
        self.schema
            .field_at(ordinal)
            .map(|f| &f.data_type)
            .ok_or_else(|| TabularError::type_mismatch(ordinal, "ordinal out of range"))
    }

    fn integer<T: TryFrom<i64>>(&self, ordinal: usize, kind: &str) -> delta_share_tabular::Result<T> {
        let value = self.checked(ordinal)?;
        value
            .as_i64()
            .and_then(|v| T::try_from(v).ok())
            .ok_or_else(|| mismatch(ordinal, kind, value))
    }
}

fn mismatch(ordinal: usize, expected: &str, actual: &JsonValue) -> TabularError {
    TabularError::type_mismatch(
        ordinal,
        format!("expected {}, found JSON {}", expected, json_kind(actual)),
    )
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Row for JsonRow {
    fn schema(&self) -> &StructType {
        &self.schema
    }

    fn is_null_at(&self, ordinal: usize) -> bool {
        self.raw(ordinal).map_or(true, JsonValue::is_null)
    }

    fn get_boolean(&self, ordinal: usize) -> delta_share_tabular::Result<bool> {
        let value = self.checked(ordinal)?;
        value.as_bool().ok_or_else(|| mismatch(ordinal, "boolean", value))
    }

    fn get_byte(&self, ordinal: usize) -> delta_share_tabular::Result<i8> {
        self.integer(ordinal, "byte")
    }

    fn get_short(&self, ordinal: usize) -> delta_share_tabular::Result<i16> {
        self.integer(ordinal, "short")
    }

    fn get_int(&self, ordinal: usize) -> delta_share_tabular::Result<i32> {
        self.integer(ordinal, "integer")
    }

    fn get_long(&self, ordinal: usize) -> delta_share_tabular::Result<i64> {
        self.integer(ordinal, "long")
    }

    fn get_float(&self, ordinal: usize) -> delta_share_tabular::Result<f32> {
        let value = self.checked(ordinal)?;
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| mismatch(ordinal, "float", value))
    }

    fn get_double(&self, ordinal: usize) -> delta_share_tabular::Result<f64> {
        let value = self.checked(ordinal)?;
        value.as_f64().ok_or_else(|| mismatch(ordinal, "double", value))
    }

    fn get_string(&self, ordinal: usize) -> delta_share_tabular::Result<&str> {
        let value = self.checked(ordinal)?;
        value.as_str().ok_or_else(|| mismatch(ordinal, "string", value))
    }

    fn get_binary(&self, ordinal: usize) -> delta_share_tabular::Result<Vec<u8>> {
        let value = self.checked(ordinal)?;
        value
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()
            })
            .ok_or_else(|| mismatch(ordinal, "binary", value))
    }

    fn get_date(&self, ordinal: usize) -> delta_share_tabular::Result<i32> {
        self.integer(ordinal, "date")
    }

    fn get_timestamp(&self, ordinal: usize) -> delta_share_tabular::Result<i64> {
        self.integer(ordinal, "timestamp")
    }

    fn get_decimal(&self, ordinal: usize) -> delta_share_tabular::Result<i128> {
        let value = self.checked(ordinal)?;
        match value {
            JsonValue::Number(n) => n.as_i64().map(i128::from),
            JsonValue::String(s) => s.parse::<i128>().ok(),
            _ => None,
        }
        .ok_or_else(|| mismatch(ordinal, "decimal", value))
    }

    fn get_struct(&self, ordinal: usize) -> delta_share_tabular::Result<Box<dyn Row + '_>> {
        let child_schema = match self.field_type(ordinal)? {
            DataType::Struct(st) => st.as_ref().clone(),
            _ => {
                return Err(TabularError::type_mismatch(
                    ordinal,
                    "field is not struct-typed",
                ))
            }
        };
        match self.checked(ordinal)? {
            JsonValue::Object(map) => Ok(Box::new(JsonRow::new(Arc::new(child_schema), map.clone()))),
            other => Err(mismatch(ordinal, "struct", other)),
        }
    }

    fn get_array(&self, ordinal: usize) -> delta_share_tabular::Result<Vec<Value>> {
        let element_type = match self.field_type(ordinal)? {
            DataType::Array(array) => &array.element_type,
            _ => return Err(TabularError::type_mismatch(ordinal, "field is not array-typed")),
        };
        match self.checked(ordinal)? {
            JsonValue::Array(items) => items
                .iter()
                .map(|item| json_to_value(item, element_type))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|msg| TabularError::type_mismatch(ordinal, msg)),
            other => Err(mismatch(ordinal, "array", other)),
        }
    }

    fn get_map(&self, ordinal: usize) -> delta_share_tabular::Result<Vec<(Value, Value)>> {
        let map_type = match self.field_type(ordinal)? {
            DataType::Map(map) => map,
            _ => return Err(TabularError::type_mismatch(ordinal, "field is not map-typed")),
        };
        let value = self.checked(ordinal)?;
        map_entries(value, &map_type.key_type, &map_type.value_type)
            .map_err(|msg| TabularError::type_mismatch(ordinal, msg))
    }
}

/// Convert a JSON value of a known type into an owned value.
fn json_to_value(json: &JsonValue, data_type: &DataType) -> std::result::Result<Value, String> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    let unexpected = || format!("expected {}, found JSON {}", data_type, json_kind(json));
    let value = match data_type {
        DataType::Primitive(p) => match p {
            PrimitiveType::Boolean => json.as_bool().map(Value::Boolean),
            PrimitiveType::Byte => json
                .as_i64()
                .and_then(|v| i8::try_from(v).ok())
                .map(Value::Byte),
            PrimitiveType::Short => json
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(Value::Short),
            PrimitiveType::Integer => json
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Integer),
            PrimitiveType::Long => json.as_i64().map(Value::Long),
            PrimitiveType::Float => json.as_f64().map(|v| Value::Float(v as f32)),
            PrimitiveType::Double => json.as_f64().map(Value::Double),
            PrimitiveType::String => json.as_str().map(|s| Value::String(s.to_string())),
            other => return Err(format!("{} values are not carried in row JSON", other)),
        },
        DataType::Array(array) => match json {
            JsonValue::Array(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| json_to_value(item, &array.element_type))
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            )),
            _ => None,
        },
        DataType::Map(map) => Some(Value::Map(map_entries(json, &map.key_type, &map.value_type)?)),
        DataType::Struct(st) => match json {
            JsonValue::Object(object) => Some(Value::Struct(
                st.fields
                    .iter()
                    .map(|field| {
                        object
                            .get(&field.name)
                            .map_or(Ok(Value::Null), |v| json_to_value(v, &field.data_type))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            )),
            _ => None,
        },
    };
    value.ok_or_else(unexpected)
}

fn map_entries(
    json: &JsonValue,
    key_type: &DataType,
    value_type: &DataType,
) -> std::result::Result<Vec<(Value, Value)>, String> {
    match json {
        JsonValue::Object(object) if *key_type == DataType::STRING => object
            .iter()
            .map(|(k, v)| Ok((Value::String(k.clone()), json_to_value(v, value_type)?)))
            .collect(),
        JsonValue::Array(pairs) => pairs
            .iter()
            .map(|pair| match pair.as_array().map(Vec::as_slice) {
                Some([k, v]) => Ok((json_to_value(k, key_type)?, json_to_value(v, value_type)?)),
                _ => Err("map entry must be a [key, value] pair".to_string()),
            })
            .collect(),
        other => Err(format!(
            "expected map with {} keys, found JSON {}",
            key_type,
            json_kind(other)
        )),
    }
}
