//! In-memory task registry
//!
//! Owns every live task and enforces the two capacity limits: the number of
//! tasks that may exist at once and the number of files that completes a task.
//! All mutations take the write lock; status queries take the read lock.
//!
//! Building an archive can take as long as the slowest remote file, so
//! [`TaskRegistry::get_archive`] copies the file list under the read lock,
//! releases it for the build, and only re-acquires the write lock to remove
//! the task once the archive exists.

use crate::archive::ArchiveBuilder;
use crate::config::LimitsConfig;
use crate::error::{Error, Result, TaskError};
use crate::types::{FileRequest, RegistryStats, TaskId, TaskInfo, TaskStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Registry-owned task state
#[derive(Debug, Clone)]
struct TaskEntry {
    files: Vec<FileRequest>,
    status: TaskStatus,
    created_at: DateTime<Utc>,
}

/// Result of a successful [`TaskRegistry::add_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAdded {
    /// File count after the append
    pub files: usize,
    /// Status after the append
    pub status: TaskStatus,
}

impl FileAdded {
    /// Whether this append moved the task to `Completed`
    ///
    /// Only the append that fills the task can observe `Completed`; later
    /// appends fail with [`TaskError::Full`].
    pub fn completed_task(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Task registry with fixed capacity limits
pub struct TaskRegistry {
    tasks: RwLock<HashMap<TaskId, TaskEntry>>,
    limits: LimitsConfig,
    builder: ArchiveBuilder,
}

impl TaskRegistry {
    /// Create an empty registry
    ///
    /// The limits are captured here and stay fixed for the registry's lifetime.
    pub fn new(limits: LimitsConfig, builder: ArchiveBuilder) -> Self {
        Self {
            tasks: RwLock::new(HashMap::with_capacity(limits.max_tasks)),
            limits,
            builder,
        }
    }

    /// Register a new staged task and return its ID
    ///
    /// Fails with [`TaskError::LimitReached`] when `max_tasks` tasks already exist.
    pub async fn create_task(&self) -> Result<TaskId> {
        let mut tasks = self.tasks.write().await;

        if tasks.len() >= self.limits.max_tasks {
            debug!(max_tasks = self.limits.max_tasks, "task limit reached");
            return Err(TaskError::LimitReached {
                max_tasks: self.limits.max_tasks,
            }
            .into());
        }

        let mut id = TaskId::new();
        while tasks.contains_key(&id) {
            id = TaskId::new();
        }

        tasks.insert(
            id,
            TaskEntry {
                files: Vec::with_capacity(self.limits.max_files),
                status: TaskStatus::Staged,
                created_at: Utc::now(),
            },
        );

        info!(task_id = %id, live_tasks = tasks.len(), "task created");
        Ok(id)
    }

    /// Append a file to a staged task
    ///
    /// The append that brings the file count to `max_files` flips the task to
    /// `Completed` in the same critical section. Names that would not stay at
    /// the archive root are rejected with [`TaskError::InvalidName`].
    pub async fn add_file(&self, id: TaskId, file: FileRequest) -> Result<FileAdded> {
        file.check_name()?;

        let mut tasks = self.tasks.write().await;

        let task = tasks.get_mut(&id).ok_or_else(|| TaskError::not_found(id))?;
        if task.status == TaskStatus::Completed {
            return Err(TaskError::Full {
                id,
                max_files: self.limits.max_files,
            }
            .into());
        }

        debug!(task_id = %id, entry = %file.entry_name(), link = %file.link, "adding file");
        task.files.push(file);
        if task.files.len() >= self.limits.max_files {
            task.status = TaskStatus::Completed;
            info!(task_id = %id, files = task.files.len(), "task completed");
        }

        Ok(FileAdded {
            files: task.files.len(),
            status: task.status,
        })
    }

    /// Current status of a task
    pub async fn get_status(&self, id: TaskId) -> Result<TaskStatus> {
        let tasks = self.tasks.read().await;
        tasks
            .get(&id)
            .map(|task| task.status)
            .ok_or_else(|| TaskError::not_found(id).into())
    }

    /// Snapshot of a task
    pub async fn get_task(&self, id: TaskId) -> Result<TaskInfo> {
        let tasks = self.tasks.read().await;
        tasks
            .get(&id)
            .map(|task| TaskInfo {
                id,
                files: task.files.clone(),
                status: task.status,
                created_at: task.created_at,
            })
            .ok_or_else(|| TaskError::not_found(id).into())
    }

    /// Build the task's archive and remove the task
    ///
    /// On a build failure the task stays registered with its files intact and
    /// the aggregated error is returned. When two callers race on the same
    /// task, only the one whose removal succeeds receives the archive; the
    /// other gets [`TaskError::NotFound`].
    pub async fn get_archive(&self, id: TaskId) -> Result<Vec<u8>> {
        let files = {
            let tasks = self.tasks.read().await;
            let task = tasks.get(&id).ok_or_else(|| TaskError::not_found(id))?;
            task.files.clone()
        };

        info!(task_id = %id, files = files.len(), "building archive");
        let bytes = self.builder.build(&files).await.map_err(|e| {
            warn!(task_id = %id, error = %e, "archive build failed, keeping task");
            Error::Archive(e)
        })?;

        let mut tasks = self.tasks.write().await;
        if tasks.remove(&id).is_none() {
            warn!(task_id = %id, "task consumed by a concurrent archive request");
            return Err(TaskError::not_found(id).into());
        }

        info!(task_id = %id, size_bytes = bytes.len(), live_tasks = tasks.len(), "archive handed out, task removed");
        Ok(bytes)
    }

    /// Occupancy counters
    pub async fn stats(&self) -> RegistryStats {
        let tasks = self.tasks.read().await;
        let completed = tasks
            .values()
            .filter(|task| task.status == TaskStatus::Completed)
            .count();

        RegistryStats {
            tasks: tasks.len(),
            staged: tasks.len() - completed,
            completed,
            max_tasks: self.limits.max_tasks,
            max_files: self.limits.max_files,
        }
    }
}
