//! Task service
//!
//! Composition root wiring the [`TaskRegistry`] (with its archive builder) and
//! an [`ArchiveStore`] together. The request layer talks to it through the
//! [`TaskManager`] trait, so any type exposing the same operations can stand
//! in for it.

use crate::archive::ArchiveBuilder;
use crate::config::Config;
use crate::error::Result;
use crate::registry::TaskRegistry;
use crate::storage::{ArchiveStore, LocalArchiveStore};
use crate::types::{
    Event, FileRequest, RegistryStats, TaskId, TaskInfo, TaskReport, TaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Operations the request layer needs from the task backend
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Register a new task
    async fn create_task(&self) -> Result<TaskId>;

    /// Append a file to a task and return the resulting status
    async fn add_file(&self, id: TaskId, file: FileRequest) -> Result<TaskStatus>;

    /// Current status of a task
    async fn task_status(&self, id: TaskId) -> Result<TaskStatus>;

    /// Snapshot of a task
    async fn get_task(&self, id: TaskId) -> Result<TaskInfo>;

    /// Build the task's archive; the task is removed on success
    async fn get_archive(&self, id: TaskId) -> Result<Vec<u8>>;

    /// Persist archive bytes and return the stored file name
    async fn save_archive(&self, bytes: &[u8], id: TaskId) -> Result<String>;

    /// Public download link for a stored file name
    fn download_link(&self, filename: &str) -> String;

    /// Registry occupancy counters
    async fn stats(&self) -> RegistryStats;

    /// Poll a task
    ///
    /// A staged task reports its file count. A completed task has its archive
    /// built and saved, and the report carries the download link; after that
    /// the task ID is no longer valid.
    async fn check_task(&self, id: TaskId) -> Result<TaskReport> {
        let task = self.get_task(id).await?;
        match task.status {
            TaskStatus::Staged => Ok(TaskReport::Staged {
                id,
                files: task.files.len(),
            }),
            TaskStatus::Completed => {
                let bytes = self.get_archive(id).await?;
                let filename = self.save_archive(&bytes, id).await?;
                let link = self.download_link(&filename);
                Ok(TaskReport::Completed { id, filename, link })
            }
        }
    }
}

/// Default task backend: in-memory registry plus a pluggable archive store
#[derive(Clone)]
pub struct ArchiveService {
    pub(crate) registry: Arc<TaskRegistry>,
    pub(crate) store: Arc<dyn ArchiveStore>,
    pub(crate) config: Arc<Config>,
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl ArchiveService {
    /// Create a service that stores archives in `config.storage.data_dir`
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(LocalArchiveStore::new(config.storage.data_dir.clone()));
        Self::with_store(config, store)
    }

    /// Create a service with a custom archive store
    pub fn with_store(config: Config, store: Arc<dyn ArchiveStore>) -> Result<Self> {
        config.validate()?;

        let builder = ArchiveBuilder::new(&config.archive)?;
        let registry = Arc::new(TaskRegistry::new(config.limits, builder));
        let (event_tx, _rx) = broadcast::channel(1000);

        info!(
            max_tasks = config.limits.max_tasks,
            max_files = config.limits.max_files,
            store = store.name(),
            "archive service ready"
        );

        Ok(Self {
            registry,
            store,
            config: Arc::new(config),
            event_tx,
        })
    }

    /// Subscribe to task lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Service configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() fails only when nobody is subscribed
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let manager: Arc<dyn TaskManager> = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(manager, config).await })
    }
}

#[async_trait]
impl TaskManager for ArchiveService {
    async fn create_task(&self) -> Result<TaskId> {
        let id = self.registry.create_task().await?;
        self.emit_event(Event::TaskCreated { id });
        Ok(id)
    }

    async fn add_file(&self, id: TaskId, file: FileRequest) -> Result<TaskStatus> {
        let entry = file.entry_name();
        let added = self.registry.add_file(id, file).await?;

        self.emit_event(Event::FileAdded {
            id,
            entry,
            files: added.files,
        });
        if added.completed_task() {
            self.emit_event(Event::TaskCompleted { id });
        }
        Ok(added.status)
    }

    async fn task_status(&self, id: TaskId) -> Result<TaskStatus> {
        self.registry.get_status(id).await
    }

    async fn get_task(&self, id: TaskId) -> Result<TaskInfo> {
        self.registry.get_task(id).await
    }

    async fn get_archive(&self, id: TaskId) -> Result<Vec<u8>> {
        match self.registry.get_archive(id).await {
            Ok(bytes) => {
                self.emit_event(Event::ArchiveReady {
                    id,
                    size_bytes: bytes.len() as u64,
                });
                self.emit_event(Event::TaskRemoved { id });
                Ok(bytes)
            }
            Err(e @ crate::Error::Archive(_)) => {
                self.emit_event(Event::ArchiveFailed {
                    id,
                    error: e.to_string(),
                });
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_archive(&self, bytes: &[u8], id: TaskId) -> Result<String> {
        self.store.persist(bytes, id).await.inspect_err(|e| {
            // The task is already gone at this point, so the archive is lost
            error!(task_id = %id, error = %e, "failed to save archive");
        })
    }

    fn download_link(&self, filename: &str) -> String {
        format!("{}/download/{}", self.config.public_url(), filename)
    }

    async fn stats(&self) -> RegistryStats {
        self.registry.stats().await
    }
}
