use super::*;
use crate::config::LimitsConfig;
use crate::service::ArchiveService;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::io::Cursor;
use std::time::Duration;
use tempfile::tempdir;
use tower::ServiceExt; // for oneshot()
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a service plus its config, with archives stored in a temp dir
fn create_test_service(
    max_tasks: usize,
    max_files: usize,
) -> (Arc<ArchiveService>, Arc<Config>, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let mut config = Config::default();
    config.limits = LimitsConfig {
        max_tasks,
        max_files,
    };
    config.storage.data_dir = temp_dir.path().join("data");
    config.api.public_url = Some("http://files.test".into());

    let service = Arc::new(ArchiveService::new(config).unwrap());
    let config = service.config().clone();
    (service, config, temp_dir)
}

fn router(service: &Arc<ArchiveService>, config: &Arc<Config>) -> Router {
    create_router(service.clone(), config.clone())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create(app: &Router) -> String {
    let (status, body) = send(app, "PUT", "/tasks/create", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["task_id"].as_str().unwrap().to_string()
}

fn file(name: &str, ext: &str, link: String) -> Value {
    json!({ "name": name, "ext": ext, "link": link })
}

#[tokio::test]
async fn test_create_task_returns_id() {
    let (service, config, _temp_dir) = create_test_service(2, 2);
    let app = router(&service, &config);

    let id = create(&app).await;
    let (status, body) = send(&app, "GET", &format!("/tasks/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "staged");
    assert_eq!(body["files"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_task_over_limit_is_503() {
    let (service, config, _temp_dir) = create_test_service(1, 2);
    let app = router(&service, &config);

    create(&app).await;
    let (status, body) = send(&app, "PUT", "/tasks/create", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "task_limit_reached");
}

#[tokio::test]
async fn test_add_file_to_unknown_task_is_404() {
    let (service, config, _temp_dir) = create_test_service(1, 2);
    let app = router(&service, &config);

    let unknown = crate::types::TaskId::new();
    let (status, body) = send(
        &app,
        "POST",
        &format!("/tasks/{unknown}/add"),
        Some(file("a", ".jpg", "http://x/a".into())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "task_not_found");
}

#[tokio::test]
async fn test_malformed_task_id_is_404() {
    let (service, config, _temp_dir) = create_test_service(1, 2);
    let app = router(&service, &config);

    let (status, body) = send(&app, "GET", "/tasks/not-a-task/check", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"]["task_id"], "not-a-task");
}

#[tokio::test]
async fn test_add_file_until_completed_then_409() {
    let (service, config, _temp_dir) = create_test_service(1, 2);
    let app = router(&service, &config);
    let id = create(&app).await;
    let uri = format!("/tasks/{id}/add");

    let (status, body) = send(&app, "POST", &uri, Some(file("a", ".jpg", "http://x/a".into()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "staged");

    let (status, body) = send(&app, "POST", &uri, Some(file("b", "pdf", "http://x/b".into()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = send(&app, "POST", &uri, Some(file("c", ".pdf", "http://x/c".into()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "task_full");
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected() {
    let (service, config, _temp_dir) = create_test_service(1, 2);
    let app = router(&service, &config);
    let id = create(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/tasks/{id}/add"),
        Some(file("a", ".exe", "http://x/a".into())),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(service.get_task(id.parse().unwrap()).await.unwrap().files.is_empty());
}

#[tokio::test]
async fn test_file_name_escaping_archive_root_is_400() {
    let (service, config, _temp_dir) = create_test_service(1, 2);
    let app = router(&service, &config);
    let id = create(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/tasks/{id}/add"),
        Some(file("../../x", ".jpg", "http://x/a".into())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_file_name");
    assert_eq!(body["error"]["details"]["name"], "../../x");
    assert!(service.get_task(id.parse().unwrap()).await.unwrap().files.is_empty());
}

#[tokio::test]
async fn test_check_staged_task_reports_file_count() {
    let (service, config, _temp_dir) = create_test_service(1, 3);
    let app = router(&service, &config);
    let id = create(&app).await;
    send(
        &app,
        "POST",
        &format!("/tasks/{id}/add"),
        Some(file("a", ".jpg", "http://x/a".into())),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/tasks/{id}/check"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "staged");
    assert_eq!(body["files"], 1);
}

#[tokio::test]
async fn test_check_completed_task_serves_archive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cat.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"meow".to_vec()))
        .mount(&server)
        .await;

    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);
    let id = create(&app).await;
    send(
        &app,
        "POST",
        &format!("/tasks/{id}/add"),
        Some(file("cat", ".jpg", format!("{}/cat.jpg", server.uri()))),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/tasks/{id}/check"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["link"], format!("http://files.test/download/{id}.zip"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/download/{id}.zip"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.by_index(0).unwrap().name(), "cat.jpg");

    // The task ID is spent
    let (status, _) = send(&app, "GET", &format!("/tasks/{id}/check"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_with_unreachable_file_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);
    let id = create(&app).await;
    let link = format!("{}/gone.pdf", server.uri());
    send(
        &app,
        "POST",
        &format!("/tasks/{id}/add"),
        Some(file("gone", ".pdf", link.clone())),
    )
    .await;

    let (status, body) = send(&app, "GET", &format!("/tasks/{id}/check"), None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "archive_build_failed");
    assert_eq!(body["error"]["details"]["failures"][0]["link"], link);

    // The task survives a failed build
    let (status, body) = send(&app, "GET", &format!("/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn test_download_missing_file_is_404() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/nothing.zip")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (service, config, _temp_dir) = create_test_service(3, 2);
    let app = router(&service, &config);
    create(&app).await;

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["tasks"]["tasks"], 1);
    assert_eq!(body["tasks"]["max_tasks"], 3);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let mut config = (*config).clone();
    config.api.cors_enabled = false;
    let app = router(&service, &Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);

    let (status, json) = send(&app, "GET", "/openapi.json", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(json["info"]["title"], "linkzip REST API");
    assert!(json["paths"].get("/tasks/{id}/check").is_some());
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let app = router(&service, &config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let mut config = (*config).clone();
    config.api.swagger_ui = false;
    let app = router(&service, &Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_server_stops_on_shutdown_signal() {
    let (service, config, _temp_dir) = create_test_service(1, 1);
    let mut config = (*config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(serve_with_shutdown(service, config, async {
        rx.await.ok();
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (_service, config, _temp_dir) = create_test_service(1, 1);
    let mut config = (*config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let service = Arc::new(ArchiveService::new(config).unwrap());

    let api_handle = service.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be serving");
    api_handle.abort();
}
