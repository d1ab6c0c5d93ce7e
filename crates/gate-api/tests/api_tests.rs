//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gate_api::{create_router, ApiConfig, AppState};
use gate_core::{GatewayConfig, ServiceConfig};
use gate_models::ServiceId;

fn app(services: Vec<ServiceConfig>) -> Router {
    let gateway = GatewayConfig::default()
        .with_services(services)
        .with_health_checks(false, Duration::from_secs(3600))
        .with_retry_delays(Duration::from_millis(1), Duration::from_millis(5));
    let state = AppState::with_gateway(ApiConfig::default(), gateway).unwrap();
    create_router(state, None)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_liveness() {
    let response = app(vec![])
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_process_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"trusted": true})))
        .mount(&server)
        .await;

    let app = app(vec![ServiceConfig::new(ServiceId::TrustGuard, server.uri())]);
    let response = app
        .oneshot(post_json(
            "/v1/process",
            json!({
                "request_id": "r1",
                "service": "trust-guard",
                "payload": {"content": "hello", "validation_type": "general"}
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["request_id"], "r1");
    assert_eq!(body["result"], json!({"trusted": true}));
}

#[tokio::test]
async fn test_process_failure_is_structured() {
    let app = app(vec![ServiceConfig::new(ServiceId::TrustGuard, "http://127.0.0.1:9")]);
    let response = app
        .oneshot(post_json(
            "/v1/process",
            json!({"request_id": "r2", "service": "trust-guard", "payload": {"content": "hello"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("validation_type"));
}

#[tokio::test]
async fn test_malformed_json_is_structured() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/process")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(vec![]).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Validation error"));
}

#[tokio::test]
async fn test_status_lists_configured_services() {
    let app = app(vec![
        ServiceConfig::new(ServiceId::TokenGuard, "http://127.0.0.1:9"),
        ServiceConfig::new(ServiceId::BiasGuard, "http://127.0.0.1:9").with_enabled(false),
    ]);
    let response = app
        .oneshot(Request::builder().uri("/v1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let services = body["services"].as_array().unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0]["service"], "token-guard");
    assert_eq!(services[0]["circuit"]["state"], "closed");
    assert_eq!(services[1]["enabled"], false);
}

#[tokio::test]
async fn test_health_for_single_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = app(vec![ServiceConfig::new(ServiceId::SecurityGuard, server.uri())]);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/v1/health/security-guard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "healthy");

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/v1/health/vision-guard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(Request::builder().uri("/v1/health/token-guard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "not_found");
}

#[tokio::test]
async fn test_check_all_health() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = app(vec![ServiceConfig::new(ServiceId::HealthGuard, server.uri())]);
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/health/check")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["service"], "health-guard");
    assert_eq!(body[0]["status"], "unhealthy");
    assert_eq!(body[0]["last_error"], "HTTP 503");
}

#[tokio::test]
async fn test_request_id_header_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app(vec![]).oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}
