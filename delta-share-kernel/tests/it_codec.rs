//! Integration tests for the row JSON codec.
//!
//! Covers the round-trip and null-preservation properties, the three reserved
//! scan-file columns, and rejection of types without a JSON mapping.

use std::sync::Arc;

use async_trait::async_trait;
use delta_share_kernel::deletion_vector::{sharing_url, z85};
use delta_share_kernel::{
    AbsolutePathPolicy, DeletionVectorLocator, MemoryStorage, PathResolver, Result,
    RowJsonCodec, SharingError, UrlSigner,
};
use delta_share_tabular::{DataType, GenericRow, Row, StructField, StructType, Value};
use serde_json::Value as JsonValue;

const ROOT: &str = "s3://bucket/table";

#[derive(Debug)]
struct TestSigner;

#[async_trait]
impl UrlSigner for TestSigner {
    async fn sign(&self, path: &str, length: u64) -> Result<String> {
        Ok(format!("https://signed.test/{}?bytes={}&sig=x%2Fy", path, length))
    }
}

fn codec_with(storage: MemoryStorage, policy: AbsolutePathPolicy) -> RowJsonCodec {
    RowJsonCodec::new(
        ROOT,
        PathResolver::new(policy),
        DeletionVectorLocator::new(Arc::new(storage), Arc::new(TestSigner)),
    )
}

fn codec() -> RowJsonCodec {
    codec_with(MemoryStorage::new(), AbsolutePathPolicy::Accept)
}

fn row(fields: Vec<StructField>, values: Vec<Value>) -> GenericRow {
    GenericRow::try_new(Arc::new(StructType::new(fields)), values).expect("valid row")
}

fn mixed_schema() -> Vec<StructField> {
    vec![
        StructField::not_null("id", DataType::LONG),
        StructField::nullable("name", DataType::STRING),
        StructField::nullable("flag", DataType::BOOLEAN),
        StructField::nullable("tiny", DataType::BYTE),
        StructField::nullable("small", DataType::SHORT),
        StructField::nullable("count", DataType::INTEGER),
        StructField::nullable("ratio", DataType::FLOAT),
        StructField::nullable("score", DataType::DOUBLE),
        StructField::nullable("tags", DataType::array(DataType::STRING, true)),
        StructField::nullable(
            "props",
            DataType::map(DataType::STRING, DataType::STRING, true),
        ),
        StructField::nullable(
            "counts",
            DataType::map(DataType::INTEGER, DataType::LONG, false),
        ),
        StructField::nullable(
            "nested",
            DataType::struct_type(vec![
                StructField::nullable("a", DataType::INTEGER),
                StructField::nullable("b", DataType::STRING),
                StructField::nullable(
                    "inner",
                    DataType::struct_type(vec![StructField::nullable("c", DataType::DOUBLE)]),
                ),
            ]),
        ),
        StructField::nullable(
            "empty",
            DataType::struct_type(vec![StructField::nullable("z", DataType::LONG)]),
        ),
    ]
}

/// Serializing then deserializing yields the same schema and values at every
/// ordinal, including nested structs and nulls.
#[tokio::test]
async fn test_round_trip_preserves_schema_and_values() {
    let original = row(
        mixed_schema(),
        vec![
            Value::Long(9_007_199_254_740_993),
            Value::Null,
            Value::Boolean(false),
            Value::Byte(-8),
            Value::Short(300),
            Value::Integer(-70_000),
            Value::Float(1.1),
            Value::Double(-0.25),
            Value::Array(vec!["a".into(), Value::Null, "c".into()]),
            Value::Map(vec![
                ("zeta".into(), "1".into()),
                ("alpha".into(), Value::Null),
            ]),
            Value::Map(vec![(Value::Integer(3), Value::Long(30))]),
            Value::Struct(vec![
                Value::Integer(1),
                Value::Null,
                Value::Struct(vec![Value::Double(2.5)]),
            ]),
            Value::Null,
        ],
    );

    let codec = codec();
    let json = codec.serialize(&original).await.expect("serialize");
    let decoded = codec.deserialize(&json).expect("deserialize");

    assert_eq!(decoded.schema(), original.schema());
    let copy = GenericRow::from_row(&decoded).expect("read back");
    assert_eq!(copy, original);
}

/// A null field serializes to JSON null whatever its declared type.
#[tokio::test]
async fn test_nulls_serialize_as_json_null() {
    let fields = mixed_schema();
    let mut values = vec![Value::Long(1)];
    values.extend(std::iter::repeat(Value::Null).take(fields.len() - 1));
    let original = row(fields, values);

    let object = codec().to_json(&original, &[]).await.expect("encode");
    assert_eq!(object.len(), original.schema().len());
    for (name, value) in object.iter().skip(1) {
        assert_eq!(value, &JsonValue::Null, "field {}", name);
    }
}

fn storage_type_row(storage_type: &str) -> GenericRow {
    row(
        vec![StructField::not_null(
            "add",
            DataType::struct_type(vec![StructField::nullable(
                "deletionVector",
                DataType::struct_type(vec![
                    StructField::not_null("storageType", DataType::STRING),
                    StructField::nullable("offset", DataType::INTEGER),
                ]),
            )]),
        )],
        vec![Value::Struct(vec![Value::Struct(vec![
            storage_type.into(),
            Value::Integer(1),
        ])])],
    )
}

/// Rows differing only in the stored `storageType` serialize identically.
#[tokio::test]
async fn test_storage_type_is_always_p() {
    let codec = codec();
    let mut encoded = Vec::new();
    for storage_type in ["u", "i", "p"] {
        let object = codec
            .to_json(&storage_type_row(storage_type), &[])
            .await
            .expect("encode");
        encoded.push(object["add"]["deletionVector"]["storageType"].clone());
    }
    assert!(encoded.iter().all(|v| v == "p"), "{:?}", encoded);
}

fn scan_file_row(path: &str, deletion_vector: Option<(&str, &str)>) -> GenericRow {
    let dv_type = DataType::struct_type(vec![
        StructField::not_null("storageType", DataType::STRING),
        StructField::not_null("pathOrInlineDv", DataType::STRING),
        StructField::nullable("offset", DataType::INTEGER),
        StructField::not_null("sizeInBytes", DataType::INTEGER),
        StructField::not_null("cardinality", DataType::LONG),
    ]);
    let dv = match deletion_vector {
        Some((storage_type, reference)) => Value::Struct(vec![
            storage_type.into(),
            reference.into(),
            Value::Integer(1),
            Value::Integer(36),
            Value::Long(2),
        ]),
        None => Value::Null,
    };
    row(
        vec![
            StructField::not_null(
                "add",
                DataType::struct_type(vec![
                    StructField::not_null("path", DataType::STRING),
                    StructField::not_null("size", DataType::LONG),
                    StructField::nullable("deletionVector", dv_type),
                ]),
            ),
            StructField::not_null("tableRoot", DataType::STRING),
        ],
        vec![
            Value::Struct(vec![path.into(), Value::Long(635), dv]),
            ROOT.into(),
        ],
    )
}

/// File paths are resolved against the table root, never signed.
#[tokio::test]
async fn test_file_path_resolution() {
    let object = codec()
        .to_json(&scan_file_row("date=2024-01-01/part-0001.parquet", None), &[])
        .await
        .expect("encode");

    assert_eq!(
        object["add"]["path"],
        "s3://bucket/table/date=2024-01-01/part-0001.parquet"
    );
    assert_eq!(object["add"]["deletionVector"], JsonValue::Null);
    assert_eq!(object["tableRoot"], ROOT);
}

/// Absolute file paths pass through under `accept` and fail under `reject`.
#[tokio::test]
async fn test_absolute_path_policy() {
    let absolute = "s3://elsewhere/part-0001.parquet";

    let object = codec_with(MemoryStorage::new(), AbsolutePathPolicy::Accept)
        .to_json(&scan_file_row(absolute, None), &[])
        .await
        .expect("accepted");
    assert_eq!(object["add"]["path"], absolute);

    let err = codec_with(MemoryStorage::new(), AbsolutePathPolicy::Reject)
        .serialize(&scan_file_row(absolute, None))
        .await
        .unwrap_err();
    assert!(matches!(err, SharingError::AbsolutePathRejected(_)));
}

/// A `u` reference resolves under its prefix and becomes a signed sharing URL.
#[tokio::test]
async fn test_deletion_vector_becomes_sharing_url() {
    let uuid = uuid::Uuid::from_u128(1);
    let reference = format!("AB{}", z85::encode_uuid(&uuid));
    let physical = format!(
        "{}/AB/deletion_vector_00000000-0000-0000-0000-000000000001.bin",
        ROOT
    );
    let storage = MemoryStorage::new().with_file(physical.clone(), vec![7u8; 42]);

    let object = codec_with(storage, AbsolutePathPolicy::Accept)
        .to_json(
            &scan_file_row("part-0001.parquet", Some(("u", reference.as_str()))),
            &[],
        )
        .await
        .expect("encode");

    let dv = &object["add"]["deletionVector"];
    let expected = sharing_url(
        &format!("https://signed.test/{}?bytes=42&sig=x%2Fy", physical),
        42,
    );
    assert_eq!(dv["pathOrInlineDv"], expected.as_str());
    assert!(expected.starts_with("delta-sharing:///https%3A%2F%2Fsigned.test%2F"));
    assert!(expected.ends_with("/42"));
    assert_eq!(dv["storageType"], "p");
    // Non-reserved siblings are copied
    assert_eq!(dv["sizeInBytes"], 36);
}

/// A missing deletion-vector file fails the encode.
#[tokio::test]
async fn test_missing_deletion_vector_file_propagates() {
    let reference = format!("AB{}", z85::encode_uuid(&uuid::Uuid::from_u128(1)));
    let err = codec()
        .serialize(&scan_file_row("part-0.parquet", Some(("u", reference.as_str()))))
        .await
        .unwrap_err();
    assert!(matches!(err, SharingError::NotFound(_)), "{}", err);
}

/// Types outside the supported set fail with `UnsupportedType`, never null.
#[tokio::test]
async fn test_unsupported_types_fail() {
    let cases = vec![
        (DataType::TIMESTAMP, Value::Timestamp(1_700_000_000_000_000)),
        (DataType::BINARY, Value::Binary(vec![1, 2])),
        (DataType::DATE, Value::Date(19_000)),
        (DataType::decimal(10, 2), Value::Decimal(12_345)),
    ];
    for (data_type, value) in cases {
        let label = data_type.to_string();
        let row = row(vec![StructField::nullable("v", data_type)], vec![value]);
        let err = codec().serialize(&row).await.unwrap_err();
        assert!(
            matches!(err, SharingError::UnsupportedType(_)),
            "{}: {}",
            label,
            err
        );
    }

    // Also inside arrays
    let row = row(
        vec![StructField::nullable(
            "v",
            DataType::array(DataType::TIMESTAMP, false),
        )],
        vec![Value::Array(vec![Value::Timestamp(1)])],
    );
    let err = codec().serialize(&row).await.unwrap_err();
    assert!(matches!(err, SharingError::UnsupportedType(_)));
}

/// The envelope carries the schema as JSON text under `schema`.
#[tokio::test]
async fn test_envelope_shape() {
    let json = codec()
        .serialize(&scan_file_row("part-0.parquet", None))
        .await
        .expect("serialize");
    let parsed: JsonValue = serde_json::from_str(&json).expect("valid JSON");
    let envelope = parsed.as_object().expect("object");

    let keys: Vec<&str> = envelope.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["schema", "row"]);
    let schema = StructType::from_json(envelope["schema"].as_str().expect("schema text"))
        .expect("schema parses");
    assert_eq!(schema.fields[0].name, "add");
}

fn xorshift(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

/// Doubles survive a round trip bit for bit, including subnormals and the
/// extremes of the range.
#[tokio::test]
async fn test_round_trip_preserves_awkward_doubles() {
    let mut doubles = vec![
        1.0715660391465826e-75,
        f64::MAX,
        f64::MIN,
        f64::MIN_POSITIVE,
        f64::EPSILON,
        5e-324,
        2.2250738585072009e-308,
        -0.0,
        0.1 + 0.2,
    ];
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    while doubles.len() < 5_000 {
        let candidate = f64::from_bits(xorshift(&mut state));
        if candidate.is_finite() {
            doubles.push(candidate);
        }
    }

    let original = row(
        vec![
            StructField::not_null("first", DataType::DOUBLE),
            StructField::not_null("all", DataType::array(DataType::DOUBLE, false)),
        ],
        vec![
            Value::Double(doubles[0]),
            Value::Array(doubles.iter().copied().map(Value::Double).collect()),
        ],
    );

    let codec = codec();
    let json = codec.serialize(&original).await.expect("serialize");
    let decoded = GenericRow::from_row(&codec.deserialize(&json).expect("deserialize"))
        .expect("read back");

    assert_eq!(decoded.get_double(0).expect("first").to_bits(), doubles[0].to_bits());
    let values = decoded.get_array(1).expect("all");
    assert_eq!(values.len(), doubles.len());
    for (value, expected) in values.iter().zip(&doubles) {
        match value {
            Value::Double(v) => assert_eq!(v.to_bits(), expected.to_bits(), "{:e}", expected),
            other => panic!("expected a double, found {:?}", other),
        }
    }
}

/// A string-keyed map repeating a key cannot be written as a JSON object
/// without losing an entry, so the encode fails.
#[tokio::test]
async fn test_duplicate_map_keys_fail() {
    let duplicated = row(
        vec![StructField::nullable(
            "m",
            DataType::map(DataType::STRING, DataType::LONG, false),
        )],
        vec![Value::Map(vec![
            ("k".into(), Value::Long(1)),
            ("k".into(), Value::Long(2)),
        ])],
    );
    let err = codec().serialize(&duplicated).await.unwrap_err();
    assert!(matches!(err, SharingError::JsonEncode(_)), "{}", err);

    // Repeated keys in non-string maps are kept as pairs
    let pairs = row(
        vec![StructField::nullable(
            "m",
            DataType::map(DataType::INTEGER, DataType::LONG, false),
        )],
        vec![Value::Map(vec![
            (Value::Integer(1), Value::Long(1)),
            (Value::Integer(1), Value::Long(2)),
        ])],
    );
    let codec = codec();
    let json = codec.serialize(&pairs).await.expect("serialize");
    let decoded = GenericRow::from_row(&codec.deserialize(&json).expect("deserialize"))
        .expect("read back");
    assert_eq!(decoded, pairs);
}
