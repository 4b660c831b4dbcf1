//! # linkzip
//!
//! Collect remote file links into tasks and hand each completed task back as a
//! single zip archive.
//!
//! A task accepts files (`name`, extension, link) until it holds
//! `limits.max_files` of them, at which point it is completed. Building the
//! archive of a completed task fetches every link concurrently and writes the
//! bodies into one in-memory zip; on success the task is removed and its slot
//! freed for a new one.
//!
//! ## Quick Start
//!
//! ```no_run
//! use linkzip::{ArchiveService, Config, Extension, FileRequest, TaskManager, TaskReport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ArchiveService::new(Config::default())?;
//!
//!     let id = service.create_task().await?;
//!     service
//!         .add_file(id, FileRequest::new("cover", Extension::Jpg, "https://example.com/cover.jpg"))
//!         .await?;
//!
//!     if let TaskReport::Completed { link, .. } = service.check_task(id).await? {
//!         println!("download: {link}");
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Concurrent download-and-zip archive builder
pub mod archive;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// In-memory task registry
pub mod registry;
/// Task service tying the registry to archive storage
pub mod service;
/// Archive persistence
pub mod storage;
/// Core types
pub mod types;

pub use archive::ArchiveBuilder;
pub use config::{ApiConfig, ArchiveConfig, Compression, Config, LimitsConfig, StorageConfig};
pub use error::{
    ApiError, ArchiveError, Error, ErrorDetail, FetchError, FetchErrorKind, Result, TaskError,
    ToHttpStatus,
};
pub use registry::{FileAdded, TaskRegistry};
pub use service::{ArchiveService, TaskManager};
pub use storage::{ArchiveStore, LocalArchiveStore};
pub use types::{
    Event, Extension, FileRequest, RegistryStats, TaskId, TaskInfo, TaskReport, TaskStatus,
};

use std::sync::Arc;

/// Serve the REST API for `service` until SIGTERM or SIGINT (Ctrl+C) arrives
///
/// In-flight requests are allowed to finish before this returns.
///
/// # Example
///
/// ```no_run
/// use linkzip::{ArchiveService, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ArchiveService::new(Config::default())?;
///     run_with_shutdown(service).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: ArchiveService) -> Result<()> {
    let config = service.config().clone();
    let manager: Arc<dyn TaskManager> = Arc::new(service);

    api::serve_with_shutdown(manager, config, shutdown_signal()).await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolve once the process receives SIGTERM or SIGINT (Ctrl+C)
///
/// A signal whose handler cannot be registered is skipped; with neither
/// available this waits on `ctrl_c` instead.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let sigterm = signal(SignalKind::terminate())
        .inspect_err(|e| tracing::warn!(error = %e, "SIGTERM handler unavailable"))
        .ok();
    let sigint = signal(SignalKind::interrupt())
        .inspect_err(|e| tracing::warn!(error = %e, "SIGINT handler unavailable"))
        .ok();

    let received = match (sigterm, sigint) {
        (Some(mut sigterm), Some(mut sigint)) => tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        },
        (Some(mut sigterm), None) => {
            sigterm.recv().await;
            "SIGTERM"
        }
        (None, Some(mut sigint)) => {
            sigint.recv().await;
            "SIGINT"
        }
        (None, None) => {
            tokio::signal::ctrl_c().await.ok();
            "ctrl_c"
        }
    };

    tracing::info!(signal = received, "shutting down");
}

/// Resolve once the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("received Ctrl+C, shutting down");
        }
        Err(e) => {
            tracing::error!(error = %e, "ctrl_c listener failed, shutting down");
        }
    }
}
