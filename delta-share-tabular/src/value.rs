//! Owned values stored in rows.

use crate::types::{DataType, PrimitiveType};

/// A single value, typed by the schema it is stored under.
///
/// Struct values hold their children positionally; the field names and types
/// come from the enclosing `StructType`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    /// Days since 1970-01-01
    Date(i32),
    /// Microseconds since epoch (UTC)
    Timestamp(i64),
    /// Unscaled value; precision and scale live in the type
    Decimal(i128),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Struct(Vec<Value>),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check that this value can be stored under `data_type`.
    ///
    /// Null conforms to every type; nullability is checked by the caller
    /// since it is a property of the field, not the type. Nested element
    /// and value nullability flags are enforced here.
    pub fn conforms_to(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::Boolean(_), DataType::Primitive(PrimitiveType::Boolean))
            | (Value::Byte(_), DataType::Primitive(PrimitiveType::Byte))
            | (Value::Short(_), DataType::Primitive(PrimitiveType::Short))
            | (Value::Integer(_), DataType::Primitive(PrimitiveType::Integer))
            | (Value::Long(_), DataType::Primitive(PrimitiveType::Long))
            | (Value::Float(_), DataType::Primitive(PrimitiveType::Float))
            | (Value::Double(_), DataType::Primitive(PrimitiveType::Double))
            | (Value::String(_), DataType::Primitive(PrimitiveType::String))
            | (Value::Binary(_), DataType::Primitive(PrimitiveType::Binary))
            | (Value::Date(_), DataType::Primitive(PrimitiveType::Date))
            | (Value::Timestamp(_), DataType::Primitive(PrimitiveType::Timestamp))
            | (Value::Decimal(_), DataType::Primitive(PrimitiveType::Decimal { .. })) => true,
            (Value::Array(items), DataType::Array(array_type)) => items.iter().all(|item| {
                (array_type.contains_null || !item.is_null())
                    && item.conforms_to(&array_type.element_type)
            }),
            (Value::Map(entries), DataType::Map(map_type)) => entries.iter().all(|(k, v)| {
                !k.is_null()
                    && k.conforms_to(&map_type.key_type)
                    && (map_type.value_contains_null || !v.is_null())
                    && v.conforms_to(&map_type.value_type)
            }),
            (Value::Struct(children), DataType::Struct(struct_type)) => {
                children.len() == struct_type.len()
                    && children
                        .iter()
                        .zip(struct_type.fields.iter())
                        .all(|(child, field)| {
                            (field.nullable || !child.is_null())
                                && child.conforms_to(&field.data_type)
                        })
            }
            _ => false,
        }
    }

    /// Variant name for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Integer(_) => "integer",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Decimal(_) => "decimal",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructField;

    #[test]
    fn test_primitive_conformance() {
        assert!(Value::Long(1).conforms_to(&DataType::LONG));
        assert!(!Value::Long(1).conforms_to(&DataType::INTEGER));
        assert!(Value::Null.conforms_to(&DataType::STRING));
        assert!(Value::Decimal(1234).conforms_to(&DataType::decimal(10, 2)));
    }

    #[test]
    fn test_nested_nullability() {
        let strict = DataType::array(DataType::STRING, false);
        assert!(Value::Array(vec!["a".into()]).conforms_to(&strict));
        assert!(!Value::Array(vec![Value::Null]).conforms_to(&strict));

        let map = DataType::map(DataType::STRING, DataType::STRING, true);
        assert!(Value::Map(vec![("k".into(), Value::Null)]).conforms_to(&map));
        assert!(!Value::Map(vec![(Value::Null, "v".into())]).conforms_to(&map));

        let st = DataType::struct_type(vec![
            StructField::not_null("a", DataType::INTEGER),
            StructField::nullable("b", DataType::STRING),
        ]);
        assert!(Value::Struct(vec![Value::Integer(1), Value::Null]).conforms_to(&st));
        assert!(!Value::Struct(vec![Value::Null, Value::Null]).conforms_to(&st));
        assert!(!Value::Struct(vec![Value::Integer(1)]).conforms_to(&st));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(5i64)), Value::Long(5));
        assert_eq!(Value::from(None::<String>), Value::Null);
    }
}
