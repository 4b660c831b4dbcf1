//! OpenAPI documentation and schema generation
//!
//! Compile-time OpenAPI spec for the linkzip REST API, generated with utoipa.

use utoipa::OpenApi;

/// OpenAPI documentation for the linkzip REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "linkzip REST API",
        version = "0.1.0",
        description = "Collect remote file links into tasks and download each completed task as a single zip archive",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::create_task,
        crate::api::routes::add_file,
        crate::api::routes::get_task,
        crate::api::routes::check_task,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::types::TaskId,
            crate::types::TaskStatus,
            crate::types::Extension,
            crate::types::FileRequest,
            crate::types::TaskInfo,
            crate::types::TaskReport,
            crate::types::RegistryStats,
            crate::api::routes::CreateTaskResponse,
            crate::api::routes::AddFileResponse,
            crate::error::ApiError,
            crate::error::ErrorDetail,
        )
    ),
    tags(
        (name = "tasks", description = "Task lifecycle: create, add files, poll, download"),
        (name = "system", description = "Health and API documentation"),
    )
)]
pub struct ApiDoc;
