//! Schema types and their JSON representation.
//!
//! Schemas serialize to the Delta schema JSON format, which is also the
//! format embedded in a table's `metaData.schemaString`:
//!
//! ```json
//! {"type":"struct","fields":[
//!   {"name":"id","type":"long","nullable":false,"metadata":{}},
//!   {"name":"tags","type":{"type":"array","elementType":"string","containsNull":true},
//!    "nullable":true,"metadata":{}}
//! ]}
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TabularError};

/// Primitive (leaf) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    String,
    Binary,
    /// Days since 1970-01-01
    Date,
    /// Microseconds since epoch (UTC)
    Timestamp,
    Decimal { precision: u8, scale: u8 },
}

impl PrimitiveType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(Self::Boolean),
            "byte" => Some(Self::Byte),
            "short" => Some(Self::Short),
            "integer" => Some(Self::Integer),
            "long" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "string" => Some(Self::String),
            "binary" => Some(Self::Binary),
            "date" => Some(Self::Date),
            "timestamp" => Some(Self::Timestamp),
            s if s.starts_with("decimal(") && s.ends_with(')') => {
                let inner = &s["decimal(".len()..s.len() - 1];
                let (precision, scale) = inner.split_once(',')?;
                Some(Self::Decimal {
                    precision: precision.trim().parse().ok()?,
                    scale: scale.trim().parse().ok()?,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Byte => f.write_str("byte"),
            Self::Short => f.write_str("short"),
            Self::Integer => f.write_str("integer"),
            Self::Long => f.write_str("long"),
            Self::Float => f.write_str("float"),
            Self::Double => f.write_str("double"),
            Self::String => f.write_str("string"),
            Self::Binary => f.write_str("binary"),
            Self::Date => f.write_str("date"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
        }
    }
}

impl TryFrom<String> for PrimitiveType {
    type Error = TabularError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
            .ok_or_else(|| TabularError::SchemaJson(format!("Unknown primitive type: {}", value)))
    }
}

impl From<PrimitiveType> for String {
    fn from(value: PrimitiveType) -> Self {
        value.to_string()
    }
}

/// Any schema type. The variant set is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataType {
    Primitive(PrimitiveType),
    Array(Box<ArrayType>),
    Map(Box<MapType>),
    Struct(Box<StructType>),
}

impl DataType {
    pub const BOOLEAN: Self = Self::Primitive(PrimitiveType::Boolean);
    pub const BYTE: Self = Self::Primitive(PrimitiveType::Byte);
    pub const SHORT: Self = Self::Primitive(PrimitiveType::Short);
    pub const INTEGER: Self = Self::Primitive(PrimitiveType::Integer);
    pub const LONG: Self = Self::Primitive(PrimitiveType::Long);
    pub const FLOAT: Self = Self::Primitive(PrimitiveType::Float);
    pub const DOUBLE: Self = Self::Primitive(PrimitiveType::Double);
    pub const STRING: Self = Self::Primitive(PrimitiveType::String);
    pub const BINARY: Self = Self::Primitive(PrimitiveType::Binary);
    pub const DATE: Self = Self::Primitive(PrimitiveType::Date);
    pub const TIMESTAMP: Self = Self::Primitive(PrimitiveType::Timestamp);

    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self::Primitive(PrimitiveType::Decimal { precision, scale })
    }

    pub fn array(element_type: DataType, contains_null: bool) -> Self {
        Self::Array(Box::new(ArrayType::new(element_type, contains_null)))
    }

    pub fn map(key_type: DataType, value_type: DataType, value_contains_null: bool) -> Self {
        Self::Map(Box::new(MapType::new(key_type, value_type, value_contains_null)))
    }

    pub fn struct_type(fields: Vec<StructField>) -> Self {
        Self::Struct(Box::new(StructType::new(fields)))
    }

    /// Short type name for error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Primitive(p) => p.to_string(),
            Self::Array(_) => "array".to_string(),
            Self::Map(_) => "map".to_string(),
            Self::Struct(_) => "struct".to_string(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p),
            Self::Array(a) => write!(f, "array<{}>", a.element_type),
            Self::Map(m) => write!(f, "map<{},{}>", m.key_type, m.value_type),
            Self::Struct(s) => {
                f.write_str("struct<")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", field.name, field.data_type)?;
                }
                f.write_str(">")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ArrayTag {
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MapTag {
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StructTag {
    Struct,
}

/// Array type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayType {
    #[serde(rename = "type")]
    tag: ArrayTag,
    pub element_type: DataType,
    pub contains_null: bool,
}

impl ArrayType {
    pub fn new(element_type: DataType, contains_null: bool) -> Self {
        Self {
            tag: ArrayTag::Array,
            element_type,
            contains_null,
        }
    }
}

/// Map type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapType {
    #[serde(rename = "type")]
    tag: MapTag,
    pub key_type: DataType,
    pub value_type: DataType,
    pub value_contains_null: bool,
}

impl MapType {
    pub fn new(key_type: DataType, value_type: DataType, value_contains_null: bool) -> Self {
        Self {
            tag: MapTag::Map,
            key_type,
            value_type,
            value_contains_null,
        }
    }
}

/// A named, typed field of a struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub nullable: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl StructField {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
            metadata: BTreeMap::new(),
        }
    }

    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, true)
    }

    pub fn not_null(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, data_type, false)
    }
}

/// Ordered struct schema. Also the schema of a whole row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructType {
    #[serde(rename = "type")]
    tag: StructTag,
    pub fields: Vec<StructField>,
}

impl StructType {
    pub fn new(fields: Vec<StructField>) -> Self {
        Self {
            tag: StructTag::Struct,
            fields,
        }
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at an ordinal.
    #[inline]
    pub fn field_at(&self, ordinal: usize) -> Option<&StructField> {
        self.fields.get(ordinal)
    }

    /// Field by name.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Ordinal of a field by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Serialize to a JSON value in the Delta schema format.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| TabularError::SchemaJson(format!("Failed to serialize schema: {}", e)))
    }

    /// Serialize to JSON text in the Delta schema format.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TabularError::SchemaJson(format!("Failed to serialize schema: {}", e)))
    }

    /// Parse a schema from a JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| TabularError::SchemaJson(format!("Failed to parse schema: {}", e)))
    }

    /// Parse a schema from JSON text (e.g. a Delta `schemaString`).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TabularError::SchemaJson(format!("Failed to parse schema: {}", e)))
    }
}
