//! Archive persistence
//!
//! The task service hands finished archive bytes to an [`ArchiveStore`] and gets
//! back an opaque file name that the API turns into a download link.

use crate::error::{Error, Result};
use crate::types::TaskId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Trait for storing finished archives
///
/// Implementations decide where the bytes live; callers only rely on the
/// returned file name being resolvable by whatever serves downloads.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Store the archive of `task_id` and return its file name
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be written.
    async fn persist(&self, bytes: &[u8], task_id: TaskId) -> Result<String>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Stores archives as `<task_id>.zip` files in a local directory
#[derive(Debug, Clone)]
pub struct LocalArchiveStore {
    dir: PathBuf,
}

impl LocalArchiveStore {
    /// Create a store rooted at `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the archives are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name used for a task's archive
    pub fn file_name(task_id: TaskId) -> String {
        format!("{task_id}.zip")
    }
}

#[async_trait]
impl ArchiveStore for LocalArchiveStore {
    async fn persist(&self, bytes: &[u8], task_id: TaskId) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create archive directory '{}': {}", self.dir.display(), e),
            ))
        })?;

        let filename = Self::file_name(task_id);
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to write archive '{}': {}", path.display(), e),
            ))
        })?;

        info!(task_id = %task_id, path = %path.display(), size_bytes = bytes.len(), "archive saved");
        Ok(filename)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn persist_writes_task_named_zip() {
        let temp_dir = tempdir().unwrap();
        let store = LocalArchiveStore::new(temp_dir.path().join("archives"));
        let id = TaskId::new();

        let filename = store.persist(b"PK\x05\x06", id).await.unwrap();

        assert_eq!(filename, format!("{id}.zip"));
        let written = std::fs::read(store.dir().join(&filename)).unwrap();
        assert_eq!(written, b"PK\x05\x06");
    }

    #[tokio::test]
    async fn persist_overwrites_previous_archive() {
        let temp_dir = tempdir().unwrap();
        let store = LocalArchiveStore::new(temp_dir.path());
        let id = TaskId::new();

        store.persist(b"first", id).await.unwrap();
        let filename = store.persist(b"second", id).await.unwrap();

        assert_eq!(std::fs::read(temp_dir.path().join(filename)).unwrap(), b"second");
    }

    #[tokio::test]
    async fn persist_reports_unwritable_directory() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let store = LocalArchiveStore::new(blocker.join("nested"));

        let err = store.persist(b"data", TaskId::new()).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
