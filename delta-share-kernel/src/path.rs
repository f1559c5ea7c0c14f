//! Resolution of table-relative storage paths.
//!
//! Delta stores data file paths as URI references, normally relative to the
//! table root (`date=2024-01-01/part-0001.parquet`). Resolution is a plain
//! segment join; percent-encoding in the reference is preserved as-is.

use crate::config::AbsolutePathPolicy;
use crate::error::{Result, SharingError};

/// Whether a path reference is absolute (a hierarchical URI or a leading `/`).
///
/// `scheme:rest` without a `/` after the colon (`a:b/part.parquet`) is an
/// opaque URI and treated as relative.
pub fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    url::Url::parse(path).is_ok_and(|url| !url.cannot_be_a_base())
}

/// Join a relative reference onto a root with a single `/` separator.
pub fn join(root: &str, child: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), child)
}

/// Resolves file references against a table root.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver {
    policy: AbsolutePathPolicy,
}

impl PathResolver {
    pub fn new(policy: AbsolutePathPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AbsolutePathPolicy {
        self.policy
    }

    /// Resolve `child` against `root`.
    ///
    /// Absolute references are returned unchanged under
    /// [`AbsolutePathPolicy::Accept`] and rejected under
    /// [`AbsolutePathPolicy::Reject`].
    pub fn resolve(&self, root: &str, child: &str) -> Result<String> {
        if child.is_empty() {
            return Err(SharingError::invalid_path("empty path reference"));
        }
        if is_absolute(child) {
            return match self.policy {
                AbsolutePathPolicy::Accept => {
                    tracing::debug!(path = child, "table stores an absolute file path");
                    Ok(child.to_string())
                }
                AbsolutePathPolicy::Reject => {
                    Err(SharingError::AbsolutePathRejected(child.to_string()))
                }
            };
        }
        if root.is_empty() {
            return Err(SharingError::invalid_path(format!(
                "cannot resolve '{}' against an empty root",
                child
            )));
        }
        Ok(join(root, child))
    }
}
