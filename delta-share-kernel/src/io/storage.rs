//! Storage abstraction for Delta tables.
//!
//! This module provides the `DeltaStorage` trait used to read the Delta log and
//! look up deletion-vector file lengths, with implementations for memory (tests),
//! the local filesystem (`native` feature) and S3 (`aws` feature).
//!
//! Paths are full URIs (`s3://bucket/key`, `file:///tmp/t`) or plain local paths.
//! No implementation retries; the first failure is returned.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::{Result, SharingError};

/// Storage trait for reading table files.
///
/// `Send + Sync` so one instance bound to a table root can be shared behind an `Arc`.
#[async_trait]
pub trait DeltaStorage: Debug + Send + Sync {
    /// Read an entire file.
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Get the size of a file in bytes.
    async fn file_size(&self, path: &str) -> Result<u64>;

    /// List files directly under a directory, as full paths in lexicographic order.
    ///
    /// A missing directory lists as empty.
    async fn list(&self, dir: &str) -> Result<Vec<String>>;
}

fn child_path(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// In-memory storage for testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: BTreeMap<String, Bytes>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file to the storage.
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<Bytes>) {
        self.files.insert(path.into(), content.into());
    }

    /// Builder form of [`MemoryStorage::add_file`].
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.add_file(path, content);
        self
    }
}

#[async_trait]
impl DeltaStorage for MemoryStorage {
    async fn read(&self, path: &str) -> Result<Bytes> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SharingError::not_found(path))
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        self.files
            .get(path)
            .map(|c| c.len() as u64)
            .ok_or_else(|| SharingError::not_found(path))
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = child_path(dir, "");
        Ok(self
            .files
            .keys()
            .filter(|k| {
                k.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            })
            .cloned()
            .collect())
    }
}

/// Local filesystem storage (native targets only).
///
/// Accepts `file://` URIs (percent-decoded via `url`) and plain paths.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Default)]
pub struct LocalFileStorage;

#[cfg(feature = "native")]
impl LocalFileStorage {
    pub fn new() -> Self {
        Self
    }

    /// Convert a URI or plain path to a filesystem path.
    pub fn to_fs_path(path: &str) -> Result<std::path::PathBuf> {
        if path.starts_with("file:") {
            let url = url::Url::parse(path)
                .map_err(|e| SharingError::invalid_path(format!("{}: {}", path, e)))?;
            return url
                .to_file_path()
                .map_err(|_| SharingError::invalid_path(format!("Not a local file URI: {}", path)));
        }
        if path.contains("://") {
            return Err(SharingError::invalid_path(format!(
                "Local storage cannot read {}",
                path
            )));
        }
        Ok(std::path::PathBuf::from(path))
    }

    fn map_io(path: &str, e: std::io::Error) -> SharingError {
        if e.kind() == std::io::ErrorKind::NotFound {
            SharingError::not_found(path)
        } else {
            SharingError::storage(format!("{}: {}", path, e))
        }
    }
}

#[cfg(feature = "native")]
#[async_trait]
impl DeltaStorage for LocalFileStorage {
    async fn read(&self, path: &str) -> Result<Bytes> {
        let fs_path = Self::to_fs_path(path)?;
        tokio::fs::read(&fs_path)
            .await
            .map(Bytes::from)
            .map_err(|e| Self::map_io(path, e))
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        let fs_path = Self::to_fs_path(path)?;
        let meta = tokio::fs::metadata(&fs_path)
            .await
            .map_err(|e| Self::map_io(path, e))?;
        if !meta.is_file() {
            return Err(SharingError::storage(format!("Not a file: {}", path)));
        }
        Ok(meta.len())
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let fs_path = Self::to_fs_path(dir)?;
        let mut entries = match tokio::fs::read_dir(&fs_path).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::map_io(dir, e)),
        };

        let mut results = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::map_io(dir, e))?
        {
            let file_type = entry.file_type().await.map_err(|e| Self::map_io(dir, e))?;
            if file_type.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                results.push(child_path(dir, &name));
            }
        }
        results.sort();
        Ok(results)
    }
}

/// Parse an S3 URI into (scheme, bucket, key).
///
/// Supports `s3://bucket/key` and the Hadoop-style `s3a://bucket/key`.
pub fn parse_s3_uri(path: &str) -> Result<(&str, &str, &str)> {
    let (scheme, rest) = path.split_once("://").ok_or_else(|| {
        SharingError::invalid_path(format!("Invalid S3 URI (must start with s3://): {}", path))
    })?;
    if scheme != "s3" && scheme != "s3a" {
        return Err(SharingError::invalid_path(format!(
            "Invalid S3 URI (must start with s3://): {}",
            path
        )));
    }
    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(SharingError::invalid_path(format!(
            "Empty bucket name in S3 URI: {}",
            path
        )));
    }
    Ok((scheme, bucket, key))
}

/// Build an S3 client from backend settings, with SDK retries disabled.
#[cfg(feature = "aws")]
pub async fn build_s3_client(
    config: &crate::config::S3BackendConfig,
) -> Result<aws_sdk_s3::Client> {
    use crate::config_value::ConfigValue;
    use aws_credential_types::Credentials;

    let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .retry_config(aws_config::retry::RetryConfig::disabled());

    if let Some(region) = ConfigValue::resolve_opt(config.region.as_ref())? {
        config_loader = config_loader.region(aws_config::Region::new(region));
    }

    let access_key = ConfigValue::resolve_opt(config.access_key_id.as_ref())?;
    let secret_key = ConfigValue::resolve_opt(config.secret_access_key.as_ref())?;
    match (access_key, secret_key) {
        (Some(access_key_id), Some(secret_access_key)) => {
            let session_token = ConfigValue::resolve_opt(config.session_token.as_ref())?;
            let creds = Credentials::new(
                access_key_id,
                secret_access_key,
                session_token,
                None,
                "delta-share-config",
            );
            config_loader = config_loader.credentials_provider(creds);
        }
        (None, None) => {}
        _ => {
            return Err(SharingError::config(
                "S3 access_key_id and secret_access_key must be set together",
            ))
        }
    }

    let sdk_config = config_loader.load().await;
    let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = ConfigValue::resolve_opt(config.endpoint.as_ref())? {
        s3_config = s3_config.endpoint_url(endpoint);
    }
    if config.path_style {
        s3_config = s3_config.force_path_style(true);
    }

    Ok(aws_sdk_s3::Client::from_conf(s3_config.build()))
}

/// S3 storage.
///
/// `Clone` is cheap: the SDK client is `Arc`-backed internally.
#[cfg(feature = "aws")]
#[derive(Clone)]
pub struct S3DeltaStorage {
    client: aws_sdk_s3::Client,
}

#[cfg(feature = "aws")]
impl Debug for S3DeltaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3DeltaStorage").finish_non_exhaustive()
    }
}

#[cfg(feature = "aws")]
impl S3DeltaStorage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    pub async fn from_config(config: &crate::config::S3BackendConfig) -> Result<Self> {
        Ok(Self::new(build_s3_client(config).await?))
    }

    /// The underlying client, shared with the URL signer.
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl DeltaStorage for S3DeltaStorage {
    async fn read(&self, path: &str) -> Result<Bytes> {
        let (_, bucket, key) = parse_s3_uri(path)?;

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    SharingError::not_found(path)
                } else {
                    SharingError::storage(format!("S3 GetObject failed: {}", e))
                }
            })?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| SharingError::storage(format!("Failed to read S3 body: {}", e)))?;

        Ok(body.into_bytes())
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        let (_, bucket, key) = parse_s3_uri(path)?;

        let response = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    SharingError::not_found(path)
                } else {
                    SharingError::storage(format!("S3 HeadObject failed: {}", e))
                }
            })?;

        response
            .content_length()
            .map(|l| l as u64)
            .ok_or_else(|| SharingError::storage("No content-length in HEAD response"))
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let (scheme, bucket, key) = parse_s3_uri(dir)?;
        let prefix = format!("{}/", key.trim_end_matches('/'));

        let mut results = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(&prefix)
                .delimiter("/")
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| SharingError::storage(format!("S3 ListObjectsV2 failed: {}", e)))?;

            for object in response.contents() {
                if let Some(object_key) = object.key() {
                    results.push(format!("{}://{}/{}", scheme, bucket, object_key));
                }
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        results.sort();
        Ok(results)
    }
}
