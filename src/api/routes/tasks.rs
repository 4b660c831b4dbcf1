//! Task handlers: create, add file, inspect, check.

use super::{AddFileResponse, CreateTaskResponse, parse_task_id};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{FileRequest, TaskInfo, TaskReport, TaskStatus};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

/// PUT /tasks/create - Register a new task
#[utoipa::path(
    put,
    path = "/tasks/create",
    tag = "tasks",
    responses(
        (status = 201, description = "Task created", body = CreateTaskResponse),
        (status = 503, description = "Task limit reached", body = crate::error::ApiError)
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateTaskResponse>)> {
    let task_id = state.manager.create_task().await?;
    tracing::info!(task_id = %task_id, "task created");
    Ok((StatusCode::CREATED, Json(CreateTaskResponse { task_id })))
}

/// POST /tasks/:id/add - Add a file to a task
#[utoipa::path(
    post,
    path = "/tasks/{id}/add",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    request_body = FileRequest,
    responses(
        (status = 200, description = "File added", body = AddFileResponse),
        (status = 400, description = "File name would leave the archive root", body = crate::error::ApiError),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 409, description = "Task already completed", body = crate::error::ApiError),
        (status = 422, description = "Malformed file request")
    )
)]
pub async fn add_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(file): Json<FileRequest>,
) -> Result<Json<AddFileResponse>> {
    let id = parse_task_id(&id)?;
    let entry = file.entry_name();
    let status = state.manager.add_file(id, file).await?;

    let message = match status {
        TaskStatus::Staged => format!("{entry} added"),
        TaskStatus::Completed => format!("{entry} added, task completed"),
    };
    Ok(Json(AddFileResponse { message, status }))
}

/// GET /tasks/:id - Inspect a task
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = TaskInfo),
        (status = 404, description = "Task not found", body = crate::error::ApiError)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskInfo>> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.manager.get_task(id).await?))
}

/// GET /tasks/:id/check - Poll a task
///
/// Once the task is completed this builds and saves its archive, and the
/// task ID stops being valid.
#[utoipa::path(
    get,
    path = "/tasks/{id}/check",
    tag = "tasks",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task report, with a download link when completed", body = TaskReport),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
        (status = 502, description = "One or more files could not be fetched", body = crate::error::ApiError),
        (status = 500, description = "Archive could not be saved", body = crate::error::ApiError)
    )
)]
pub async fn check_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskReport>> {
    let id = parse_task_id(&id)?;
    Ok(Json(state.manager.check_task(id).await?))
}
