//! HTTP contract of the gateway, driven through the router with a stub engine.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use rstest::rstest;
use serde_json::{Value, json};
use stvd::{
    config::ServiceLimits,
    dispatch::InvocationDescriptor,
    engine::Compute,
    error::StructuredError,
    server::{AppState, PublishedConfig, http::router},
};
use tower::ServiceExt as _;

struct StubEngine {
    calls: Mutex<Vec<Vec<String>>>,
    reply: Result<String, StructuredError>,
}

impl StubEngine {
    fn replying(reply: Result<String, StructuredError>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply,
        })
    }

    fn calls(&self) -> Vec<Vec<String>> { self.calls.lock().expect("lock").clone() }
}

#[async_trait]
impl Compute for StubEngine {
    async fn compute(&self, invocation: InvocationDescriptor) -> Result<String, StructuredError> {
        self.calls.lock().expect("lock").push(invocation.into_argv());
        self.reply.clone()
    }
}

fn state(engine: Arc<StubEngine>) -> AppState {
    let published = PublishedConfig {
        limits: ServiceLimits::default(),
        max_execution_time_seconds: 3,
    };
    AppState::new(published, engine)
}

async fn post_compute(engine: Arc<StubEngine>, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/compute")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .expect("request");
    let response = router(state(engine)).oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[rstest]
#[tokio::test]
async fn valid_action_reaches_engine() {
    let engine = StubEngine::replying(Ok("{\"result\":1}".to_owned()));
    let (status, body) = post_compute(
        Arc::clone(&engine),
        r#"{"type":"dominoDfs","modelParameters":{"type":"tianJi","horses":3},"heuristic":"epistemic"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "data": "{\"result\":1}"}));
    assert_eq!(engine.calls(), [["tian_ji", "domino", "3", "2"]]);
}

#[rstest]
#[tokio::test]
async fn out_of_range_parameter_never_reaches_engine() {
    let engine = StubEngine::replying(Ok("unused".to_owned()));
    let (status, body) = post_compute(
        Arc::clone(&engine),
        r#"{"type":"lowerApproximation","modelParameters":{"type":"bridgeEndplay","deckSize":16,"cardsInHand":1}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "error": {
                "type": "ParameterRangeError",
                "parameterName": "deckSize",
                "value": 16,
                "min": 1,
                "max": 15
            }
        })
    );
    assert!(engine.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn oversized_model_file_is_rejected_by_id() {
    let engine = StubEngine::replying(Ok("unused".to_owned()));
    let model = "x".repeat(300 * 1024);
    let request = json!({
        "type": "modelGeneration",
        "modelParameters": {"type": "file", "modelString": model},
        "reduced": false
    });
    let (_, body) = post_compute(Arc::clone(&engine), &request.to_string()).await;
    assert_eq!(body["error"]["type"], "FileSizeError");
    assert_eq!(body["error"]["fileId"], "model");
    assert_eq!(body["error"]["maxSize"], 262_144);
    assert!(engine.calls().is_empty());
}

#[rstest]
#[case("not json")]
#[case(r#"{"type":"teleport"}"#)]
#[case(r#"{"type":"dominoDfs","modelParameters":{"type":"tianJi","horses":3}}"#)]
#[tokio::test]
async fn undecodable_requests_become_unknown_errors(#[case] payload: &str) {
    let engine = StubEngine::replying(Ok("unused".to_owned()));
    let (status, body) = post_compute(Arc::clone(&engine), payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["type"], "UnknownError");
    assert!(engine.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn engine_timeout_is_reported() {
    let engine = StubEngine::replying(Err(StructuredError::MaxExecutionTimeExceeded));
    let (_, body) = post_compute(
        engine,
        r#"{"type":"upperApproximation","modelParameters":{"type":"drones","numberOfDrones":2,"initialEnergy":3}}"#,
    )
    .await;
    assert_eq!(
        body,
        json!({"status": "error", "error": {"type": "MaxExecutionTimeExceededError"}})
    );
}

#[rstest]
#[tokio::test]
async fn config_endpoint_publishes_limits() {
    let engine = StubEngine::replying(Ok("unused".to_owned()));
    let request = Request::builder()
        .uri("/config")
        .body(Body::empty())
        .expect("request");
    let response = router(state(engine)).oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["maxExecutionTimeSeconds"], 3);
    assert_eq!(body["parameterizedModels"]["simpleVoting"]["max"]["candidates"], 3);
    assert_eq!(body["fileModel"]["maxNumberOfAgentTypes"], 100);
}
