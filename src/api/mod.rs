//! REST API server module
//!
//! Thin HTTP layer over a [`TaskManager`]: task creation, file submission,
//! polling, and static download of finished archives.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::service::TaskManager;
use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    routing::{get, post, put},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `PUT /tasks/create` - Register a new task
/// - `POST /tasks/:id/add` - Add a file to a task
/// - `GET /tasks/:id` - Inspect a task
/// - `GET /tasks/:id/check` - Poll a task; returns a download link once completed
///
/// ## Downloads
/// - `GET /download/:file` - Fetch a finished archive
///
/// ## System
/// - `GET /health` - Health check with registry occupancy
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(manager: Arc<dyn TaskManager>, config: Arc<Config>) -> Router {
    let state = AppState::new(manager, config.clone());

    let router = Router::new()
        .route("/tasks/create", put(routes::create_task))
        .route("/tasks/:id/add", post(routes::add_file))
        .route("/tasks/:id/check", get(routes::check_task))
        .route("/tasks/:id", get(routes::get_task))
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .nest_service("/download", ServeDir::new(&config.storage.data_dir));

    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Last layer applied is outermost: the request id is set before the
    // trace span is created, and copied onto the response afterwards.
    let router = router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if config.api.cors_enabled {
        router.layer(build_cors_layer(&config.api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server fails; see [`serve_with_shutdown`] for a variant that
/// stops on a signal.
pub async fn start_api_server(manager: Arc<dyn TaskManager>, config: Arc<Config>) -> Result<()> {
    serve_with_shutdown(manager, config, std::future::pending()).await
}

/// Start the API server and stop gracefully once `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    manager: Arc<dyn TaskManager>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(manager, config);

    let listener = TcpListener::bind(bind_address).await.map_err(Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(Error::Io)?,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
