use crate::schemas::HealthResponse;
use crate::test_utils::TestContext;
use axum::http::StatusCode;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "healthy");
    assert_eq!(body.database, "connected");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let ctx = TestContext::new().await;

    let response = ctx.server.get("/api-docs/openapi.json").await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["paths"]["/recipe/recipes"].is_object());
}
