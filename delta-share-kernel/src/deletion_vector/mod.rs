//! Deletion-vector references and their signed locations.
//!
//! A `u`-typed reference is `<random prefix><20-char Z85 UUID>`; the file lives
//! at `<root>[/<prefix>]/deletion_vector_<uuid>.bin`. The locator resolves that
//! path, looks up its length, signs it and wraps the result in the sharing URL
//! scheme: `delta-sharing:///<percent-encoded signed url>/<length>`.

pub mod z85;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::sync::Arc;

use crate::error::{Result, SharingError};
use crate::io::DeltaStorage;
use crate::path;
use crate::signing::UrlSigner;

pub use z85::ENCODED_UUID_LENGTH;

/// Storage type of a reference relative to the table root.
pub const STORAGE_TYPE_UUID: &str = "u";
/// Storage type of an absolute-path reference.
pub const STORAGE_TYPE_PATH: &str = "p";
/// Storage type of an inline bitmap.
pub const STORAGE_TYPE_INLINE: &str = "i";

/// Scheme token of client-facing deletion-vector URLs.
pub const SHARING_URL_SCHEME: &str = "delta-sharing";

// Signed URLs are embedded as a single path segment, so everything outside
// the unreserved set (including `/`, `?`, `&`, `=`) is encoded.
const URL_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'*');

/// Resolve a `u`-typed reference to the deletion vector's physical path.
pub fn uuid_reference_path(root: &str, reference: &str) -> Result<String> {
    if !reference.is_ascii() || reference.len() < ENCODED_UUID_LENGTH {
        return Err(SharingError::deletion_vector(format!(
            "malformed deletion vector reference {:?}",
            reference
        )));
    }
    let (prefix, encoded) = reference.split_at(reference.len() - ENCODED_UUID_LENGTH);
    let uuid = z85::decode_uuid(encoded)?;
    let file_name = format!("deletion_vector_{}.bin", uuid);

    Ok(if prefix.is_empty() {
        path::join(root, &file_name)
    } else {
        path::join(&path::join(root, prefix), &file_name)
    })
}

/// Wrap a signed URL in the sharing scheme.
pub fn sharing_url(signed_url: &str, length: u64) -> String {
    format!(
        "{}:///{}/{}",
        SHARING_URL_SCHEME,
        utf8_percent_encode(signed_url, URL_SEGMENT),
        length
    )
}

/// Locates and signs deletion-vector files for one storage backend.
#[derive(Debug, Clone)]
pub struct DeletionVectorLocator {
    storage: Arc<dyn DeltaStorage>,
    signer: Arc<dyn UrlSigner>,
}

impl DeletionVectorLocator {
    pub fn new(storage: Arc<dyn DeltaStorage>, signer: Arc<dyn UrlSigner>) -> Self {
        Self { storage, signer }
    }

    /// Physical path of a reference of the given storage type.
    ///
    /// A missing storage type is treated as `u`. Inline vectors have no file
    /// and are rejected.
    pub fn resolve_path(
        &self,
        root: &str,
        storage_type: Option<&str>,
        reference: &str,
    ) -> Result<String> {
        match storage_type.unwrap_or(STORAGE_TYPE_UUID) {
            STORAGE_TYPE_UUID => uuid_reference_path(root, reference),
            STORAGE_TYPE_PATH => Ok(reference.to_string()),
            STORAGE_TYPE_INLINE => Err(SharingError::deletion_vector(
                "inline deletion vectors are not supported",
            )),
            other => Err(SharingError::deletion_vector(format!(
                "unknown deletion vector storage type {:?}",
                other
            ))),
        }
    }

    /// Resolve, measure and sign a reference, returning the sharing URL.
    ///
    /// Length lookup failures (missing file, permissions) propagate unchanged.
    pub async fn locate(
        &self,
        root: &str,
        storage_type: Option<&str>,
        reference: &str,
    ) -> Result<String> {
        let physical = self.resolve_path(root, storage_type, reference)?;
        let length = self.storage.file_size(&physical).await?;
        let signed = self.signer.sign(&physical, length).await?;
        tracing::debug!(path = %physical, length, "signed deletion vector");
        Ok(sharing_url(&signed, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStorage;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct QuerySigner;

    #[async_trait]
    impl UrlSigner for QuerySigner {
        async fn sign(&self, path: &str, length: u64) -> Result<String> {
            Ok(format!("https://signed.example/{}?len={}&sig=a/b", path, length))
        }
    }

    const ONE: &str = "00000000000000000001";
    const ONE_FILE: &str = "deletion_vector_00000000-0000-0000-0000-000000000001.bin";

    #[test]
    fn test_reference_with_prefix() {
        let path = uuid_reference_path("s3://bucket/table", &format!("AB{}", ONE)).unwrap();
        assert_eq!(path, format!("s3://bucket/table/AB/{}", ONE_FILE));
    }

    #[test]
    fn test_reference_without_prefix() {
        let path = uuid_reference_path("s3://bucket/table", ONE).unwrap();
        assert_eq!(path, format!("s3://bucket/table/{}", ONE_FILE));
    }

    #[test]
    fn test_protocol_example_reference() {
        let path = uuid_reference_path("s3://mytable", "ab^-aqEH.-t@S}K{vb[*k^").unwrap();
        assert_eq!(
            path,
            "s3://mytable/ab/deletion_vector_d2c639aa-8816-431a-aaf6-d3fe2512ff61.bin"
        );
    }

    #[test]
    fn test_malformed_references() {
        assert!(uuid_reference_path("s3://t", "short").is_err());
        assert!(uuid_reference_path("s3://t", "é0000000000000000001").is_err());
        assert!(uuid_reference_path("s3://t", "AB~0000000000000000001").is_err());
    }

    #[test]
    fn test_sharing_url_encodes_whole_signed_url() {
        let url = sharing_url("https://b.s3.amazonaws.com/t/x.bin?X-Amz-Signature=ab%2F&y=1", 36);
        assert_eq!(
            url,
            "delta-sharing:///https%3A%2F%2Fb.s3.amazonaws.com%2Ft%2Fx.bin%3FX-Amz-Signature%3Dab%252F%26y%3D1/36"
        );
    }

    #[tokio::test]
    async fn test_locate_signs_with_length() {
        let physical = format!("s3://bucket/table/AB/{}", ONE_FILE);
        let storage = MemoryStorage::new().with_file(physical.clone(), vec![0u8; 36]);
        let locator = DeletionVectorLocator::new(Arc::new(storage), Arc::new(QuerySigner));

        let url = locator
            .locate("s3://bucket/table", Some("u"), &format!("AB{}", ONE))
            .await
            .unwrap();

        let expected_signed = format!("https://signed.example/{}?len=36&sig=a/b", physical);
        assert_eq!(url, sharing_url(&expected_signed, 36));
        assert!(url.ends_with("/36"));
        assert!(!url["delta-sharing:///".len()..url.len() - 3].contains('/'));
    }

    #[tokio::test]
    async fn test_locate_missing_file_propagates() {
        let locator =
            DeletionVectorLocator::new(Arc::new(MemoryStorage::new()), Arc::new(QuerySigner));
        let err = locator.locate("s3://bucket/table", None, ONE).await.unwrap_err();
        assert!(matches!(err, SharingError::NotFound(_)));
    }

    #[test]
    fn test_storage_types() {
        let locator =
            DeletionVectorLocator::new(Arc::new(MemoryStorage::new()), Arc::new(QuerySigner));
        assert_eq!(
            locator
                .resolve_path("s3://t", Some("p"), "s3://elsewhere/dv.bin")
                .unwrap(),
            "s3://elsewhere/dv.bin"
        );
        assert!(locator.resolve_path("s3://t", Some("i"), "wi5b=000010000siXQKl0rr91000f55c8Xg0@@D72lkbi5=-{L").is_err());
        assert!(locator.resolve_path("s3://t", Some("x"), ONE).is_err());
    }
}
