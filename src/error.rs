//! Error types for linkzip
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Task, Archive, Config, etc.)
//! - Aggregation of per-file fetch failures into a single archive error
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use crate::types::TaskId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for linkzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for linkzip
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "limits.max_tasks")
        key: Option<String>,
    },

    /// Task registry rejected the operation
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Archive could not be built
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of a single file fetch (client construction etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Task registry errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Registry already holds the maximum number of tasks
    #[error("tasks limit exceeded: at most {max_tasks} tasks may exist at once")]
    LimitReached {
        /// Configured task limit
        max_tasks: usize,
    },

    /// No task with this ID exists (never issued, or already consumed)
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was not found
        id: String,
    },

    /// File name cannot be used as a flat archive entry
    #[error("invalid file name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Task already reached its file limit
    #[error("task {id} is completed: max files count ({max_files}) reached")]
    Full {
        /// The completed task
        id: TaskId,
        /// Configured per-task file limit
        max_files: usize,
    },
}

impl TaskError {
    /// Convenience constructor for a missing task
    pub fn not_found(id: impl ToString) -> Self {
        TaskError::NotFound { id: id.to_string() }
    }
}

/// Archive build errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// One or more files could not be fetched; no archive was produced
    #[error("{} of the task's files failed: {}", .failures.len(), join_failures(.failures))]
    Fetch {
        /// Every failed fetch of the build attempt
        failures: Vec<FetchError>,
    },

    /// The archive container could not be finalized
    #[error("failed to finalize archive: {0}")]
    Finalize(String),
}

impl ArchiveError {
    /// Failures carried by this error (empty for non-fetch errors)
    pub fn failures(&self) -> &[FetchError] {
        match self {
            ArchiveError::Fetch { failures } => failures,
            ArchiveError::Finalize(_) => &[],
        }
    }
}

fn join_failures(failures: &[FetchError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure of a single file during an archive build
///
/// Never surfaced on its own; always carried inside [`ArchiveError::Fetch`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{name} ({link}): {kind}")]
pub struct FetchError {
    /// Archive entry name of the file
    pub name: String,
    /// Remote link that was fetched
    pub link: String,
    /// What went wrong
    pub kind: FetchErrorKind,
}

/// Reason a single file could not be added to the archive
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Request exceeded the configured timeout
    #[error("timed out")]
    Timeout,

    /// Connection or request failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote answered with a non-success status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Body could not be read completely
    #[error("failed to read body: {0}")]
    Body(String),

    /// Entry could not be written into the archive
    #[error("failed to write archive entry: {0}")]
    Write(String),

    /// Fetch task was cancelled or panicked
    #[error("fetch task aborted: {0}")]
    Aborted(String),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 5f0c... not found",
///     "details": {
///       "task_id": "5f0c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,

            Error::Task(TaskError::NotFound { .. }) => 404,
            Error::Task(TaskError::Full { .. }) => 409,
            Error::Task(TaskError::LimitReached { .. }) => 503,
            Error::Task(TaskError::InvalidName { .. }) => 400,

            // Remote files are upstream of us
            Error::Archive(ArchiveError::Fetch { .. }) => 502,
            Error::Network(_) => 502,

            Error::Archive(ArchiveError::Finalize(_)) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Task(e) => match e {
                TaskError::LimitReached { .. } => "task_limit_reached",
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::Full { .. } => "task_full",
                TaskError::InvalidName { .. } => "invalid_file_name",
            },
            Error::Archive(e) => match e {
                ArchiveError::Fetch { .. } => "archive_build_failed",
                ArchiveError::Finalize(_) => "archive_finalize_failed",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Task(TaskError::NotFound { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::Full { id, max_files }) => Some(serde_json::json!({
                "task_id": id,
                "max_files": max_files,
            })),
            Error::Task(TaskError::InvalidName { name, reason }) => Some(serde_json::json!({
                "name": name,
                "reason": reason,
            })),
            Error::Task(TaskError::LimitReached { max_tasks }) => Some(serde_json::json!({
                "max_tasks": max_tasks,
            })),
            Error::Archive(ArchiveError::Fetch { failures }) => Some(serde_json::json!({
                "failures": failures
                    .iter()
                    .map(|f| serde_json::json!({
                        "name": f.name,
                        "link": f.link,
                        "reason": f.kind.to_string(),
                    }))
                    .collect::<Vec<_>>(),
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
