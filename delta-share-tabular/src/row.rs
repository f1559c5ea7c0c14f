//! The `Row` abstraction and its owned implementation.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{Result, TabularError};
use crate::types::{DataType, PrimitiveType, StructType};
use crate::value::Value;

/// A schema-typed record with ordinal access.
///
/// Field count and types are exactly those of [`Row::schema`]. Accessors
/// return an error when called on the wrong type or on a null value; callers
/// check [`Row::is_null_at`] first.
pub trait Row: Debug + Send + Sync {
    /// Schema of this row.
    fn schema(&self) -> &StructType;

    /// Whether the value at `ordinal` is null (or absent).
    fn is_null_at(&self, ordinal: usize) -> bool;

    fn get_boolean(&self, ordinal: usize) -> Result<bool>;
    fn get_byte(&self, ordinal: usize) -> Result<i8>;
    fn get_short(&self, ordinal: usize) -> Result<i16>;
    fn get_int(&self, ordinal: usize) -> Result<i32>;
    fn get_long(&self, ordinal: usize) -> Result<i64>;
    fn get_float(&self, ordinal: usize) -> Result<f32>;
    fn get_double(&self, ordinal: usize) -> Result<f64>;
    fn get_string(&self, ordinal: usize) -> Result<&str>;
    fn get_binary(&self, ordinal: usize) -> Result<Vec<u8>>;
    fn get_date(&self, ordinal: usize) -> Result<i32>;
    fn get_timestamp(&self, ordinal: usize) -> Result<i64>;
    fn get_decimal(&self, ordinal: usize) -> Result<i128>;

    /// Child row of a struct-typed field.
    fn get_struct(&self, ordinal: usize) -> Result<Box<dyn Row + '_>>;

    /// Elements of an array-typed field.
    fn get_array(&self, ordinal: usize) -> Result<Vec<Value>>;

    /// Entries of a map-typed field, in stored order.
    fn get_map(&self, ordinal: usize) -> Result<Vec<(Value, Value)>>;
}

/// Read the value at `ordinal` from any row as an owned [`Value`].
pub fn read_value(row: &dyn Row, ordinal: usize, data_type: &DataType) -> Result<Value> {
    if row.is_null_at(ordinal) {
        return Ok(Value::Null);
    }
    let value = match data_type {
        DataType::Primitive(p) => match p {
            PrimitiveType::Boolean => Value::Boolean(row.get_boolean(ordinal)?),
            PrimitiveType::Byte => Value::Byte(row.get_byte(ordinal)?),
            PrimitiveType::Short => Value::Short(row.get_short(ordinal)?),
            PrimitiveType::Integer => Value::Integer(row.get_int(ordinal)?),
            PrimitiveType::Long => Value::Long(row.get_long(ordinal)?),
            PrimitiveType::Float => Value::Float(row.get_float(ordinal)?),
            PrimitiveType::Double => Value::Double(row.get_double(ordinal)?),
            PrimitiveType::String => Value::String(row.get_string(ordinal)?.to_string()),
            PrimitiveType::Binary => Value::Binary(row.get_binary(ordinal)?),
            PrimitiveType::Date => Value::Date(row.get_date(ordinal)?),
            PrimitiveType::Timestamp => Value::Timestamp(row.get_timestamp(ordinal)?),
            PrimitiveType::Decimal { .. } => Value::Decimal(row.get_decimal(ordinal)?),
        },
        DataType::Array(_) => Value::Array(row.get_array(ordinal)?),
        DataType::Map(_) => Value::Map(row.get_map(ordinal)?),
        DataType::Struct(_) => {
            let child = row.get_struct(ordinal)?;
            Value::Struct(GenericRow::from_row(child.as_ref())?.values)
        }
    };
    Ok(value)
}

/// An owned row: a shared schema plus one value per field.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericRow {
    schema: Arc<StructType>,
    values: Vec<Value>,
}

impl GenericRow {
    /// Create a row, validating it against the schema.
    ///
    /// Fails if the value count differs from the field count, a value does
    /// not conform to its field type, or a non-nullable field holds null.
    pub fn try_new(schema: Arc<StructType>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(TabularError::schema(format!(
                "Field count mismatch: schema has {} fields, got {} values",
                schema.len(),
                values.len()
            )));
        }
        for (field, value) in schema.fields.iter().zip(values.iter()) {
            if value.is_null() && !field.nullable {
                return Err(TabularError::schema(format!(
                    "Field '{}' is not nullable",
                    field.name
                )));
            }
            if !value.conforms_to(&field.data_type) {
                return Err(TabularError::schema(format!(
                    "Field '{}' of type {} cannot hold a {} value",
                    field.name,
                    field.data_type,
                    value.kind()
                )));
            }
        }
        Ok(Self { schema, values })
    }

    /// Copy any row into an owned row.
    pub fn from_row(row: &dyn Row) -> Result<Self> {
        let schema = row.schema();
        let values = schema
            .fields
            .iter()
            .enumerate()
            .map(|(ordinal, field)| read_value(row, ordinal, &field.data_type))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema: Arc::new(schema.clone()),
            values,
        })
    }

    /// Shared schema handle.
    pub fn schema_ref(&self) -> &Arc<StructType> {
        &self.schema
    }

    /// Values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at an ordinal.
    pub fn value(&self, ordinal: usize) -> Option<&Value> {
        self.values.get(ordinal)
    }

    fn checked(&self, ordinal: usize) -> Result<&Value> {
        match self.values.get(ordinal) {
            None => Err(TabularError::type_mismatch(
                ordinal,
                format!("ordinal out of range for {} fields", self.values.len()),
            )),
            Some(Value::Null) => Err(TabularError::type_mismatch(ordinal, "value is null")),
            Some(v) => Ok(v),
        }
    }
}

fn mismatch<T>(ordinal: usize, expected: &str, actual: &Value) -> Result<T> {
    Err(TabularError::type_mismatch(
        ordinal,
        format!("expected {}, found {}", expected, actual.kind()),
    ))
}

impl Row for GenericRow {
    fn schema(&self) -> &StructType {
        &self.schema
    }

    fn is_null_at(&self, ordinal: usize) -> bool {
        self.values.get(ordinal).map_or(true, Value::is_null)
    }

    fn get_boolean(&self, ordinal: usize) -> Result<bool> {
        match self.checked(ordinal)? {
            Value::Boolean(v) => Ok(*v),
            other => mismatch(ordinal, "boolean", other),
        }
    }

    fn get_byte(&self, ordinal: usize) -> Result<i8> {
        match self.checked(ordinal)? {
            Value::Byte(v) => Ok(*v),
            other => mismatch(ordinal, "byte", other),
        }
    }

    fn get_short(&self, ordinal: usize) -> Result<i16> {
        match self.checked(ordinal)? {
            Value::Short(v) => Ok(*v),
            other => mismatch(ordinal, "short", other),
        }
    }

    fn get_int(&self, ordinal: usize) -> Result<i32> {
        match self.checked(ordinal)? {
            Value::Integer(v) => Ok(*v),
            other => mismatch(ordinal, "integer", other),
        }
    }

    fn get_long(&self, ordinal: usize) -> Result<i64> {
        match self.checked(ordinal)? {
            Value::Long(v) => Ok(*v),
            other => mismatch(ordinal, "long", other),
        }
    }

    fn get_float(&self, ordinal: usize) -> Result<f32> {
        match self.checked(ordinal)? {
            Value::Float(v) => Ok(*v),
            other => mismatch(ordinal, "float", other),
        }
    }

    fn get_double(&self, ordinal: usize) -> Result<f64> {
        match self.checked(ordinal)? {
            Value::Double(v) => Ok(*v),
            other => mismatch(ordinal, "double", other),
        }
    }

    fn get_string(&self, ordinal: usize) -> Result<&str> {
        match self.checked(ordinal)? {
            Value::String(v) => Ok(v.as_str()),
            other => mismatch(ordinal, "string", other),
        }
    }

    fn get_binary(&self, ordinal: usize) -> Result<Vec<u8>> {
        match self.checked(ordinal)? {
            Value::Binary(v) => Ok(v.clone()),
            other => mismatch(ordinal, "binary", other),
        }
    }

    fn get_date(&self, ordinal: usize) -> Result<i32> {
        match self.checked(ordinal)? {
            Value::Date(v) => Ok(*v),
            other => mismatch(ordinal, "date", other),
        }
    }

    fn get_timestamp(&self, ordinal: usize) -> Result<i64> {
        match self.checked(ordinal)? {
            Value::Timestamp(v) => Ok(*v),
            other => mismatch(ordinal, "timestamp", other),
        }
    }

    fn get_decimal(&self, ordinal: usize) -> Result<i128> {
        match self.checked(ordinal)? {
            Value::Decimal(v) => Ok(*v),
            other => mismatch(ordinal, "decimal", other),
        }
    }

    fn get_struct(&self, ordinal: usize) -> Result<Box<dyn Row + '_>> {
        let child_schema = match self.schema.field_at(ordinal).map(|f| &f.data_type) {
            Some(DataType::Struct(st)) => st.as_ref().clone(),
            _ => {
                return Err(TabularError::type_mismatch(
                    ordinal,
                    "field is not struct-typed",
                ))
            }
        };
        match self.checked(ordinal)? {
            Value::Struct(children) => Ok(Box::new(GenericRow {
                schema: Arc::new(child_schema),
                values: children.clone(),
            })),
            other => mismatch(ordinal, "struct", other),
        }
    }

    fn get_array(&self, ordinal: usize) -> Result<Vec<Value>> {
        match self.checked(ordinal)? {
            Value::Array(items) => Ok(items.clone()),
            other => mismatch(ordinal, "array", other),
        }
    }

    fn get_map(&self, ordinal: usize) -> Result<Vec<(Value, Value)>> {
        match self.checked(ordinal)? {
            Value::Map(entries) => Ok(entries.clone()),
            other => mismatch(ordinal, "map", other),
        }
    }
}
