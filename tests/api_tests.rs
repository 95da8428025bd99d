use chatbot_relay::config::{AllowedMethods, CorsConfig};
use chatbot_relay::message::{ChatResponse, ErrorBody, HealthResponse};
use chatbot_relay::routes::create_router;
use chatbot_relay::services::{ModelClient, ModelError};
use chatbot_relay::state::AppState;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderValue, Method, Request, StatusCode, header};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::util::ServiceExt;

const ALLOWED_ORIGIN: &str = "http://localhost:5173";

struct StubModel {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl StubModel {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(ModelError::Api {
                status: 429,
                message: message.clone(),
            }),
        }
    }
}

fn cors_config(methods: AllowedMethods) -> CorsConfig {
    CorsConfig {
        allowed_origins: vec![HeaderValue::from_static(ALLOWED_ORIGIN)],
        allowed_methods: methods,
    }
}

fn app_with(model: Arc<StubModel>) -> Router {
    create_router(&cors_config(AllowedMethods::List(vec![Method::GET, Method::POST])))
        .with_state(AppState::shared(model))
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(StubModel::replying("unused"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .body(Body::from("ignored body"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = read_json(response).await;
    assert_eq!(health, HealthResponse::ok());
}

#[tokio::test]
async fn test_chat_endpoint() {
    let model = StubModel::replying("Hello back");
    let app = app_with(model.clone());

    let response = app
        .oneshot(chat_request(r#"{"user_message": "Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let chat_resp: ChatResponse = read_json(response).await;
    assert_eq!(chat_resp.response, "Hello back");
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_missing_field_is_rejected_before_model() {
    let model = StubModel::replying("Hello back");
    let app = app_with(model.clone());

    let response = app.oneshot(chat_request("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorBody = read_json(response).await;
    assert!(error.detail.contains("user_message"), "got: {}", error.detail);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() {
    let model = StubModel::replying("Hello back");
    let app = app_with(model.clone());

    for body in [r#"{"user_message": 42}"#, "not json", ""] {
        let response = app.clone().oneshot(chat_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body:?}");
    }

    // Plain text content type
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .body(Body::from(r#"{"user_message": "Hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_upstream_failure_then_health() {
    let model = StubModel::failing("quota exceeded");
    let app = app_with(model.clone());

    let response = app
        .clone()
        .oneshot(chat_request(r#"{"user_message": "Hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorBody = read_json(response).await;
    assert!(error.detail.starts_with("Error generating content: "));
    assert!(error.detail.contains("quota exceeded"));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let app = app_with(StubModel::replying("same every time"));

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(chat_request(r#"{"user_message": "ping"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        bodies.push(body);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_cors_allowed_origin() {
    let app = app_with(StubModel::replying("Hello back"));

    let mut request = chat_request(r#"{"user_message": "Hello"}"#);
    request
        .headers_mut()
        .insert(header::ORIGIN, HeaderValue::from_static(ALLOWED_ORIGIN));

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejected_origin() {
    let app = app_with(StubModel::replying("Hello back"));

    let mut request = chat_request(r#"{"user_message": "Hello"}"#);
    request.headers_mut().insert(
        header::ORIGIN,
        HeaderValue::from_static("https://evil.example.com"),
    );

    let response = app.oneshot(request).await.unwrap();

    assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn test_cors_preflight_with_method_list() {
    let app = app_with(StubModel::replying("Hello back"));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/chat")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type, x-custom")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("POST"));
    assert!(!methods.contains("DELETE"));
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
        "content-type, x-custom"
    );
}

#[tokio::test]
async fn test_cors_preflight_with_any_method() {
    let app = create_router(&cors_config(AllowedMethods::Any))
        .with_state(AppState::shared(StubModel::replying("Hello back")));

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/chat")
                .header(header::ORIGIN, ALLOWED_ORIGIN)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap(),
        "DELETE"
    );
}
