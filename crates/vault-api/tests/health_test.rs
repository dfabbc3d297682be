mod helpers;

use helpers::setup_test_app;
use serde_json::Value;

#[tokio::test]
async fn test_root_liveness() {
    let app = setup_test_app().await;
    let response = app.client().get("/").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("running"));
}

#[tokio::test]
async fn test_health_reports_dependencies() {
    let app = setup_test_app().await;
    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "healthy");
    assert_eq!(body["storage"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup_test_app().await;
    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/files/upload"].is_object());
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let app = setup_test_app().await;

    let response = app.client().get("/").await;
    assert!(!response.header("x-request-id").is_empty());
    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("referrer-policy"), "no-referrer");

    let response = app
        .client()
        .get("/")
        .add_header("X-Request-ID", "trace-123")
        .await;
    assert_eq!(response.header("x-request-id"), "trace-123");
}
