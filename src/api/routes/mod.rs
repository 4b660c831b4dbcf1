//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task creation, file submission, polling
//! - [`system`] - Health, OpenAPI

use crate::error::{Error, TaskError};
use crate::types::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;

// ============================================================================
// Response Types (shared across handlers)
// ============================================================================

/// Response for PUT /tasks/create
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateTaskResponse {
    /// ID of the newly registered task
    pub task_id: TaskId,
}

/// Response for POST /tasks/:id/add
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AddFileResponse {
    /// Human-readable outcome
    pub message: String,
    /// Task status after the file was added
    pub status: TaskStatus,
}

/// Parse a task ID from a path segment
///
/// A malformed ID cannot name a registered task, so it is reported as not found.
pub(crate) fn parse_task_id(raw: &str) -> Result<TaskId, Error> {
    raw.parse()
        .map_err(|_| Error::Task(TaskError::not_found(raw)))
}
