//! Replay of the Delta log into the latest table snapshot.

use std::collections::BTreeMap;

use super::actions::{parse_commit, Action, Add, FileKey, Metadata, Protocol};
use super::{commit_version, log_dir, MAX_READER_VERSION};
use crate::error::{Result, SharingError};
use crate::io::DeltaStorage;

/// Table state at one version.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSnapshot {
    pub version: i64,
    pub protocol: Protocol,
    pub metadata: Metadata,
    /// Active files in path order
    pub files: Vec<Add>,
}

/// Accumulates actions commit by commit.
#[derive(Debug, Default)]
pub struct LogReplay {
    protocol: Option<Protocol>,
    metadata: Option<Metadata>,
    files: BTreeMap<FileKey, Add>,
}

impl LogReplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one commit's actions in order. Later actions win.
    pub fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Protocol(protocol) => self.protocol = Some(protocol),
                Action::Metadata(metadata) => self.metadata = Some(metadata),
                Action::Add(add) => {
                    self.files.insert(add.key(), add);
                }
                Action::Remove(remove) => {
                    self.files.remove(&remove.key());
                }
            }
        }
    }

    /// Number of currently active files.
    pub fn active_files(&self) -> usize {
        self.files.len()
    }

    /// Finish replay at `version`.
    pub fn finish(self, version: i64) -> Result<LogSnapshot> {
        let protocol = self.protocol.ok_or_else(|| {
            SharingError::log(format!("no protocol action up to version {}", version))
        })?;
        let metadata = self.metadata.ok_or_else(|| {
            SharingError::log(format!("no metaData action up to version {}", version))
        })?;

        if protocol.min_reader_version > MAX_READER_VERSION {
            return Err(SharingError::log(format!(
                "reader version {} is not supported (max {})",
                protocol.min_reader_version, MAX_READER_VERSION
            )));
        }

        // BTreeMap keys sort by path first
        let files = self.files.into_values().collect();
        Ok(LogSnapshot {
            version,
            protocol,
            metadata,
            files,
        })
    }
}

/// List commit files under the table's log directory as `(version, path)`,
/// ordered by version.
///
/// Fails unless versions run contiguously from 0.
pub async fn list_commits(storage: &dyn DeltaStorage, table_root: &str) -> Result<Vec<(i64, String)>> {
    let dir = log_dir(table_root);
    let mut commits: Vec<(i64, String)> = storage
        .list(&dir)
        .await?
        .into_iter()
        .filter_map(|path| {
            let name = path.rsplit('/').next().unwrap_or(&path);
            commit_version(name).map(|version| (version, path.clone()))
        })
        .collect();
    commits.sort_by_key(|(version, _)| *version);

    if commits.is_empty() {
        return Err(SharingError::SnapshotNotFound(format!(
            "no Delta commits under {}",
            dir
        )));
    }

    for (expected, (version, path)) in (0i64..).zip(&commits) {
        if *version != expected {
            return Err(SharingError::log(format!(
                "expected commit version {} but found {} ({}); checkpoint-only logs are not supported",
                expected, version, path
            )));
        }
    }

    Ok(commits)
}

/// Replay every commit and return the latest snapshot.
pub async fn replay_latest(storage: &dyn DeltaStorage, table_root: &str) -> Result<LogSnapshot> {
    let commits = list_commits(storage, table_root).await?;
    let mut replay = LogReplay::new();
    let mut version = 0;

    for (commit, path) in commits {
        let content = storage.read(&path).await?;
        let actions = parse_commit(&path, &content)?;
        tracing::debug!(version = commit, actions = actions.len(), "replaying commit");
        replay.apply(actions);
        version = commit;
    }

    tracing::debug!(version, files = replay.active_files(), "log replay complete");
    replay.finish(version)
}
