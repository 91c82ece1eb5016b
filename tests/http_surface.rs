//! HTTP surface tests: /run, /infer, /health and /metrics through the full
//! router, including request-id middleware and error status mapping.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use pentamind::config::Config;
use pentamind::error::ProviderError;
use pentamind::handlers::AppState;
use pentamind::middleware::REQUEST_ID_HEADER;
use pentamind::providers::{MockChatAdapter, MockSearchAdapter, ProviderRegistry};
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8000

[providers.do]
kind = "openai_compatible"
base_url = "http://localhost:9001/v1"
api_key_env = "PENTAMIND_TEST_UNSET_DO_KEY"

[[backends]]
id = "fast"
provider = "do"
model = "llama3-8b-instruct"
cost_tier = "low"

[[backends]]
id = "reliable"
provider = "do"
model = "llama3.3-70b-instruct"
cost_tier = "high"

[[backends]]
id = "reasoner"
provider = "do"
model = "deepseek-r1-distill-llama-70b"
cost_tier = "med"

[routing]
classifier = "fast"
fallback = "reliable"
synthesis = "reasoner"

[routing.tasks]
solve = "reasoner"
code = "reliable"
rewrite = "reliable"
summarize = "reliable"
research = "reasoner"
"#;

const CLASSIFICATION: &str =
    r#"{"intent": "reasoning", "format": "text", "needs_citations": false, "confidence": 0.9}"#;

fn app_with(chat: Arc<MockChatAdapter>) -> Router {
    let registry = ProviderRegistry::new()
        .with_adapter("do", chat)
        .with_search(Arc::new(MockSearchAdapter::with_hits(vec![])));
    let config = Config::from_str(TEST_CONFIG).expect("fixture config should be valid");
    let state = AppState::with_registry(config, registry).expect("state should build");
    pentamind::app(state)
}

fn unconfigured_app() -> Router {
    let config = Config::from_str(TEST_CONFIG).unwrap();
    let state = AppState::with_registry(config, ProviderRegistry::new()).unwrap();
    pentamind::app(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// -------------------------------------------------------------------------
// /run
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_run_returns_report() {
    let chat = Arc::new(
        MockChatAdapter::new()
            .reply("fast", CLASSIFICATION)
            .reply("reasoner", "2 + 2 = 4"),
    );
    let response = app_with(chat)
        .oneshot(post_json(
            "/run",
            json!({"task": "solve", "input": "What is 2+2?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["final"], "2 + 2 = 4");
    assert_eq!(body["winning_backend"], "reasoner");
    assert_eq!(body["verified"], true);
    assert_eq!(body["fallback_used"], false);
    assert_eq!(body["task"], "solve");
    assert_eq!(body["mode"], "best");
    assert_eq!(body["classification"]["format"], "text");

    let stages: Vec<&str> = body["trace"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["classifier", "router", "executor", "verifier"]);
    assert_eq!(body["scoreboard"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_run_without_credentials_is_500_before_any_stage() {
    let response = unconfigured_app()
        .oneshot(post_json(
            "/run",
            json!({"task": "solve", "input": "What is 2+2?"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("PENTAMIND_TEST_UNSET_DO_KEY"), "got: {}", error);
}

#[tokio::test]
async fn test_run_rejects_blank_input() {
    let chat = Arc::new(MockChatAdapter::new());
    let response = app_with(chat.clone())
        .oneshot(post_json("/run", json!({"task": "solve", "input": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(chat.requests().is_empty(), "no backend may be called");
}

#[tokio::test]
async fn test_run_rejects_unknown_task() {
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(post_json("/run", json!({"task": "translate", "input": "hola"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_run_rejects_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/run")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_run_rejects_get() {
    let request = Request::builder()
        .method("GET")
        .uri("/run")
        .body(Body::empty())
        .unwrap();
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// -------------------------------------------------------------------------
// /infer
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_infer_calls_named_backend() {
    let chat = Arc::new(MockChatAdapter::new().reply("reasoner", "Step 1: add."));
    let response = app_with(chat.clone())
        .oneshot(post_json(
            "/infer",
            json!({"backend": "reasoner", "prompt": "What is 2+2?", "max_tokens": 50}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["final"], "Step 1: add.");
    assert_eq!(body["backend"], "reasoner");
    assert_eq!(body["trace"][0]["model"], "deepseek-r1-distill-llama-70b");
    assert!(body["usage"]["total_tokens"].as_u64().unwrap() > 0);

    let requests = chat.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].max_tokens, 50);
    assert_eq!(requests[0].user, "What is 2+2?");
}

#[tokio::test]
async fn test_infer_unknown_backend_is_400_listing_backends() {
    let chat = Arc::new(MockChatAdapter::new());
    let response = app_with(chat.clone())
        .oneshot(post_json(
            "/infer",
            json!({"backend": "gpt-9", "prompt": "Hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("gpt-9"), "got: {}", error);
    assert!(error.contains("reasoner"), "got: {}", error);
    assert!(chat.requests().is_empty());
}

#[tokio::test]
async fn test_infer_timeout_is_504() {
    let chat = Arc::new(MockChatAdapter::new().fail(
        "reliable",
        ProviderError::Timeout {
            backend: "reliable".to_string(),
            timeout_seconds: 60,
        },
    ));
    let response = app_with(chat)
        .oneshot(post_json(
            "/infer",
            json!({"backend": "reliable", "prompt": "Hello"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_infer_provider_failure_is_502() {
    let chat = Arc::new(MockChatAdapter::new().fail(
        "reliable",
        ProviderError::Http {
            backend: "reliable".to_string(),
            status: 500,
            body: "boom".to_string(),
        },
    ));
    let response = app_with(chat)
        .oneshot(post_json(
            "/infer",
            json!({"backend": "reliable", "prompt": "Hello"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("HTTP 500"));
}

#[tokio::test]
async fn test_infer_rejects_out_of_range_temperature() {
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(post_json(
            "/infer",
            json!({"backend": "reliable", "prompt": "Hello", "temperature": 3.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -------------------------------------------------------------------------
// /health, /metrics, request ids
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_ready() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body, json!({"status": "OK", "pipeline": "ready"}));
}

#[tokio::test]
async fn test_health_reports_unconfigured_with_200() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = unconfigured_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["pipeline"], "unconfigured");
}

#[tokio::test]
async fn test_metrics_exposes_run_counters_after_a_run() {
    let chat = Arc::new(
        MockChatAdapter::new()
            .reply("fast", CLASSIFICATION)
            .reply("reasoner", "4"),
    );
    let app = app_with(chat);

    let response = app
        .clone()
        .oneshot(post_json(
            "/run",
            json!({"task": "solve", "input": "What is 2+2?"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"pentamind_runs_total{outcome="verified",task="solve"} 1"#));
    assert!(text.contains("pentamind_backend_calls_total"));
}

#[tokio::test]
async fn test_request_id_is_generated_when_absent() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(request)
        .await
        .unwrap();

    let header = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .expect("response should carry a request id")
        .to_str()
        .unwrap();
    assert!(uuid::Uuid::parse_str(header).is_ok());
}

#[tokio::test]
async fn test_client_request_id_is_echoed() {
    let id = "7b0c4f4e-9a61-4a53-9a4f-5c1de2a8f5b1";
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, id)
        .body(Body::empty())
        .unwrap();
    let response = app_with(Arc::new(MockChatAdapter::new()))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), id);
}
