//! Core types for linkzip

use crate::error::TaskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a task
///
/// Generated from a random v4 UUID when the task is created and never reused
/// for the lifetime of the registry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a fresh random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task status
///
/// Transitions only forward: `Staged` → `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepting files
    Staged,
    /// File limit reached, archive can be built
    Completed,
}

impl TaskStatus {
    /// Lowercase name used in logs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Staged => "staged",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported file extensions
///
/// Accepted in JSON both with and without the leading dot (`".jpg"` or `"jpg"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Extension {
    /// JPEG image
    #[serde(rename = ".jpg", alias = "jpg", alias = ".jpeg", alias = "jpeg")]
    Jpg,
    /// PDF document
    #[serde(rename = ".pdf", alias = "pdf")]
    Pdf,
}

impl Extension {
    /// Suffix appended to the file name inside the archive, including the dot
    pub fn suffix(&self) -> &'static str {
        match self {
            Extension::Jpg => ".jpg",
            Extension::Pdf => ".pdf",
        }
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A single remote file to include in a task's archive
///
/// The link is not validated when the file is added; a bad link only
/// surfaces as a fetch failure when the archive is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileRequest {
    /// Logical file name (without extension), not required to be unique
    pub name: String,
    /// File extension
    pub ext: Extension,
    /// Remote URL fetched at archive build time
    pub link: String,
}

impl FileRequest {
    /// Create a new file request
    pub fn new(name: impl Into<String>, ext: Extension, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext,
            link: link.into(),
        }
    }

    /// Check that `name` stays a single entry at the archive root
    ///
    /// Path separators would let an extracting tool write outside its target
    /// directory, so they are rejected along with empty and control-character names.
    pub fn check_name(&self) -> Result<(), TaskError> {
        let reason = if self.name.trim().is_empty() {
            Some("name is empty")
        } else if self.name.contains(['/', '\\']) {
            Some("name contains a path separator")
        } else if self.name.chars().any(char::is_control) {
            Some("name contains a control character")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(TaskError::InvalidName {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Entry name inside the archive (`name` + extension suffix)
    pub fn entry_name(&self) -> String {
        format!("{}{}", self.name, self.ext.suffix())
    }
}

/// Snapshot of a task as stored in the registry
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskInfo {
    /// Task ID
    pub id: TaskId,
    /// Files added so far, in insertion order
    pub files: Vec<FileRequest>,
    /// Current status
    pub status: TaskStatus,
    /// When the task was created
    pub created_at: DateTime<Utc>,
}

/// Outcome of polling a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskReport {
    /// Task is still accepting files
    Staged {
        /// Task ID
        id: TaskId,
        /// Number of files added so far
        files: usize,
    },
    /// Archive was built and persisted; the task no longer exists
    Completed {
        /// Task ID
        id: TaskId,
        /// Persisted archive file name
        filename: String,
        /// Download link for the persisted archive
        link: String,
    },
}

/// Registry occupancy counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegistryStats {
    /// Live tasks
    pub tasks: usize,
    /// Tasks still accepting files
    pub staged: usize,
    /// Tasks waiting for their archive to be fetched
    pub completed: usize,
    /// Configured task limit
    pub max_tasks: usize,
    /// Configured per-task file limit
    pub max_files: usize,
}

/// Event emitted during the task lifecycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task registered
    TaskCreated {
        /// Task ID
        id: TaskId,
    },

    /// File appended to a task
    FileAdded {
        /// Task ID
        id: TaskId,
        /// Archive entry name of the added file
        entry: String,
        /// File count after the append
        files: usize,
    },

    /// Task reached its file limit
    TaskCompleted {
        /// Task ID
        id: TaskId,
    },

    /// Archive built successfully
    ArchiveReady {
        /// Task ID
        id: TaskId,
        /// Archive size in bytes
        size_bytes: u64,
    },

    /// Archive build failed; the task stays registered
    ArchiveFailed {
        /// Task ID
        id: TaskId,
        /// Error message
        error: String,
    },

    /// Task removed from the registry after its archive was handed out
    TaskRemoved {
        /// Task ID
        id: TaskId,
    },
}
