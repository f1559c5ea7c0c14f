//! Delta transaction log: actions, commit listing and replay.

pub mod actions;
pub mod replay;

pub use actions::{Action, Add, DeletionVectorDescriptor, Format, Metadata, Protocol, Remove};
pub use replay::{list_commits, replay_latest, LogReplay, LogSnapshot};

/// Log directory name under the table root.
pub const LOG_DIR_NAME: &str = "_delta_log";

/// Highest reader protocol version this crate can serve.
pub const MAX_READER_VERSION: i32 = 3;

const COMMIT_VERSION_DIGITS: usize = 20;

/// The log directory of a table.
pub fn log_dir(table_root: &str) -> String {
    crate::path::join(table_root, LOG_DIR_NAME)
}

/// Version of a commit file name (`00000000000000000012.json` → 12).
///
/// Checkpoints, checksums and compacted commits return `None`.
pub fn commit_version(file_name: &str) -> Option<i64> {
    let stem = file_name.strip_suffix(".json")?;
    if stem.len() != COMMIT_VERSION_DIGITS || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_version() {
        assert_eq!(commit_version("00000000000000000000.json"), Some(0));
        assert_eq!(commit_version("00000000000000000012.json"), Some(12));
        assert_eq!(commit_version("00000000000000000012.crc"), None);
        assert_eq!(commit_version("00000000000000000010.checkpoint.parquet"), None);
        assert_eq!(
            commit_version("00000000000000000001.00000000000000000003.compacted.json"),
            None
        );
        assert_eq!(commit_version("_last_checkpoint"), None);
        assert_eq!(commit_version("12.json"), None);
    }

    #[test]
    fn test_log_dir() {
        assert_eq!(log_dir("s3://bucket/table/"), "s3://bucket/table/_delta_log");
    }
}
