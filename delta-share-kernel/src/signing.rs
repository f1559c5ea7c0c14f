//! URL signing for files handed to sharing clients.
//!
//! A signer turns a physical path plus its byte length into a time-limited URL
//! the client can fetch without storage credentials. Only S3 presigning is
//! implemented; every other backend fails at construction.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::{BackendConfig, SharingConfig};
use crate::error::{Result, SharingError};

/// Produces signed URLs for physical file paths.
#[async_trait]
pub trait UrlSigner: Debug + Send + Sync {
    /// Sign `path`, whose size is `length` bytes.
    async fn sign(&self, path: &str, length: u64) -> Result<String>;
}

/// S3 GetObject presigner.
#[cfg(feature = "aws")]
#[derive(Clone)]
pub struct S3UrlSigner {
    client: aws_sdk_s3::Client,
    expiry: std::time::Duration,
}

#[cfg(feature = "aws")]
impl Debug for S3UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3UrlSigner")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "aws")]
impl S3UrlSigner {
    pub fn new(client: aws_sdk_s3::Client, expiry: std::time::Duration) -> Self {
        Self { client, expiry }
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl UrlSigner for S3UrlSigner {
    async fn sign(&self, path: &str, length: u64) -> Result<String> {
        use aws_sdk_s3::presigning::PresigningConfig;

        let (_, bucket, key) = crate::io::parse_s3_uri(path)?;
        let presigning = PresigningConfig::expires_in(self.expiry)
            .map_err(|e| SharingError::signing(format!("Invalid presign expiry: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| SharingError::signing(format!("S3 presign failed for {}: {}", path, e)))?;

        tracing::debug!(path, length, "presigned S3 object");
        Ok(request.uri().to_string())
    }
}

/// Build the signer for the configured backend.
///
/// Fails with [`SharingError::UnsupportedBackend`] for every backend without
/// signing support.
pub async fn signer_for_backend(config: &SharingConfig) -> Result<Arc<dyn UrlSigner>> {
    match &config.backend {
        #[cfg(feature = "aws")]
        BackendConfig::S3(s3) => {
            let client = crate::io::build_s3_client(s3).await?;
            Ok(Arc::new(S3UrlSigner::new(
                client,
                std::time::Duration::from_secs(config.presign_expiry_secs),
            )))
        }
        #[cfg(not(feature = "aws"))]
        BackendConfig::S3(_) => Err(SharingError::unsupported_backend(
            "s3 signing requires the `aws` feature",
        )),
        other => Err(SharingError::unsupported_backend(format!(
            "{} has no URL signing support",
            other.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_backends_fail_at_construction() {
        for backend in [BackendConfig::Local, BackendConfig::Gcs, BackendConfig::Azure] {
            let config = SharingConfig::new("/tmp/t").with_backend(backend);
            let err = signer_for_backend(&config).await.unwrap_err();
            assert!(
                matches!(err, SharingError::UnsupportedBackend(_)),
                "unexpected error: {}",
                err
            );
        }
    }

    #[cfg(not(feature = "aws"))]
    #[tokio::test]
    async fn test_s3_without_aws_feature_is_unsupported() {
        let config = SharingConfig::new("s3://bucket/t");
        assert!(matches!(
            signer_for_backend(&config).await,
            Err(SharingError::UnsupportedBackend(_))
        ));
    }
}
