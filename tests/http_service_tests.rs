#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP backends against an in-process mock server.
//!
//! These run on the real clock: a paused clock would auto-advance into the
//! client timeouts while the runtime waits on socket IO.

use apidocgen::chat::ChatSession;
use apidocgen::error::{GenerationError, ServiceError};
use apidocgen::generation::{
    DocumentationService, GenerationClient, HttpDocumentationService, OpenAiClient, RetryPolicy,
};
use apidocgen::rate_gate::{RateGate, RateGateConfig};
use apidocgen::spec::{EndpointDescriptor, HttpMethod, SchemaInfo};
use apidocgen::summary_cache::SummaryCache;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::mock_http::start_mock_server;

const TIMEOUT: Duration = Duration::from_secs(5);

fn endpoint() -> EndpointDescriptor {
    let mut e = EndpointDescriptor::new(HttpMethod::Post, "/pets");
    e.summary = Some("Create a pet".into());
    e.request_body = Some(json!({"required": true}));
    e
}

fn info() -> SchemaInfo {
    SchemaInfo {
        title: Some("Petstore".into()),
        version: Some("1.0.0".into()),
        base_url: Some("https://petstore.example.com".into()),
    }
}

fn summarize_service(base: &str) -> HttpDocumentationService {
    HttpDocumentationService::new(format!("{base}/api/summarize"), TIMEOUT).unwrap()
}

#[tokio::test]
async fn test_http_service_posts_endpoint_and_schema_info() {
    let (base, server) = start_mock_server(vec![(200, r##"{"summary": "# Create a pet"}"##.into())]);
    let service = summarize_service(&base);

    let summary = service.summarize(&endpoint(), &info()).await.unwrap();
    assert_eq!(summary, "# Create a pet");

    let captured = server.join().unwrap();
    assert_eq!(captured.len(), 1);
    assert!(captured[0].request_line.starts_with("POST /api/summarize "));
    assert!(captured[0]
        .header("content-type")
        .unwrap()
        .starts_with("application/json"));
    let body: Value = serde_json::from_str(&captured[0].body).unwrap();
    assert_eq!(body["endpoint"]["path"], "/pets");
    assert_eq!(body["endpoint"]["method"], "POST");
    assert_eq!(body["endpoint"]["requestBody"]["required"], true);
    assert_eq!(body["schemaInfo"]["baseUrl"], "https://petstore.example.com");
}

#[tokio::test]
async fn test_http_service_error_mapping() {
    let (base, server) = start_mock_server(vec![
        (
            429,
            r#"{"error": "Rate limit exceeded. Try again in 12 seconds.", "retryable": false}"#.into(),
        ),
        (500, r#"{"error": "Invalid OpenAI API key configuration.", "code": "invalid_api_key"}"#.into()),
        (503, String::new()),
        (400, r#"{"error": "Missing required fields: endpoint.path and endpoint.method"}"#.into()),
        (200, r#"{"result": "wrong shape"}"#.into()),
    ]);
    let service = summarize_service(&base);

    let err = service.summarize(&endpoint(), &info()).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::RateLimited {
            message: "Rate limit exceeded. Try again in 12 seconds.".into()
        }
    );

    let err = service.summarize(&endpoint(), &info()).await.unwrap_err();
    assert_eq!(err, ServiceError::InvalidCredentials);

    let err = service.summarize(&endpoint(), &info()).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Http {
            status: 503,
            message: "HTTP 503: Service Unavailable".into()
        }
    );

    let err = service.summarize(&endpoint(), &info()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing required fields: endpoint.path and endpoint.method"
    );

    let err = service.summarize(&endpoint(), &info()).await.unwrap_err();
    assert!(matches!(err, ServiceError::MalformedResponse(_)));

    server.join().unwrap();
}

#[tokio::test]
async fn test_http_service_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = summarize_service(&format!("http://{addr}"));
    let err = service.summarize(&endpoint(), &info()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_client_retries_upstream_rate_limit_over_http() {
    let (base, server) = start_mock_server(vec![
        (429, r#"{"error": "OpenAI rate limit exceeded."}"#.into()),
        (200, r#"{"summary": "done"}"#.into()),
    ]);
    let client = GenerationClient::new(
        Arc::new(summarize_service(&base)),
        SummaryCache::default(),
        RateGate::new(RateGateConfig::default()),
        RetryPolicy {
            rate_limit_backoff: Duration::from_millis(20),
            error_backoff: Duration::from_millis(10),
            ..RetryPolicy::default()
        },
    );

    let summary = client.generate(&endpoint(), &info()).await.unwrap();
    assert_eq!(summary, "done");
    assert_eq!(server.join().unwrap().len(), 2);
    assert_eq!(client.gate().remaining(None), 13);
}

#[tokio::test]
async fn test_client_gives_up_after_three_attempts_over_http() {
    let (base, server) = start_mock_server(vec![
        (500, r#"{"error": "Failed to generate summary. Please try again.", "retryable": true}"#.into()),
        (500, r#"{"error": "Failed to generate summary. Please try again.", "retryable": true}"#.into()),
        (500, r#"{"error": "Failed to generate summary. Please try again.", "retryable": true}"#.into()),
    ]);
    let client = GenerationClient::new(
        Arc::new(summarize_service(&base)),
        SummaryCache::default(),
        RateGate::new(RateGateConfig::default()),
        RetryPolicy {
            rate_limit_backoff: Duration::from_millis(20),
            error_backoff: Duration::from_millis(10),
            ..RetryPolicy::default()
        },
    );

    let err = client.generate(&endpoint(), &info()).await.unwrap_err();
    assert!(matches!(err, GenerationError::Exhausted { attempts: 3, .. }));
    assert_eq!(err.to_string(), "Failed to generate summary. Please try again.");
    assert_eq!(server.join().unwrap().len(), 3);
}

fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

#[tokio::test]
async fn test_openai_backend_request_shape() {
    let (base, server) = start_mock_server(vec![(200, completion("## 🎯 What This API Does"))]);
    let client = OpenAiClient::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(format!("{base}/v1"));

    let summary = client.summarize(&endpoint(), &info()).await.unwrap();
    assert_eq!(summary, "## 🎯 What This API Does");

    let captured = server.join().unwrap();
    assert!(captured[0].request_line.starts_with("POST /v1/chat/completions "));
    assert_eq!(captured[0].header("authorization"), Some("Bearer sk-test"));
    let body: Value = serde_json::from_str(&captured[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 2500);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    let prompt = body["messages"][1]["content"].as_str().unwrap();
    assert!(prompt.contains("Path: /pets\nMethod: POST"));
    assert!(prompt.contains("API: Petstore"));
}

#[tokio::test]
async fn test_openai_backend_error_codes() {
    let (base, server) = start_mock_server(vec![
        (
            429,
            json!({"error": {"message": "Rate limit reached for gpt-4", "code": "rate_limit_exceeded"}})
                .to_string(),
        ),
        (
            401,
            json!({"error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}})
                .to_string(),
        ),
        (200, json!({"choices": []}).to_string()),
    ]);
    let client = OpenAiClient::new("sk-bad", TIMEOUT)
        .unwrap()
        .with_base_url(&base);

    let err = client.summarize(&endpoint(), &info()).await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::RateLimited {
            message: "Rate limit reached for gpt-4".into()
        }
    );
    let err = client.summarize(&endpoint(), &info()).await.unwrap_err();
    assert_eq!(err, ServiceError::InvalidCredentials);
    let err = client.summarize(&endpoint(), &info()).await.unwrap_err();
    assert!(matches!(err, ServiceError::MalformedResponse(_)));

    server.join().unwrap();
}

#[tokio::test]
async fn test_chat_session_replays_history() {
    let (base, server) = start_mock_server(vec![
        (200, completion("Use a bearer token.")),
        (200, completion("Send it in the Authorization header.")),
    ]);
    let client = OpenAiClient::new("sk-test", TIMEOUT)
        .unwrap()
        .with_base_url(&base);
    let schema = json!({"info": {"title": "Petstore", "version": "1.0.0"}});
    let mut session = ChatSession::new(&client, &schema);

    assert_eq!(
        session.ask("How do I authenticate?").await.unwrap(),
        "Use a bearer token."
    );
    session.ask("Where does it go?").await.unwrap();
    assert_eq!(session.history().len(), 4);

    let captured = server.join().unwrap();
    let second: Value = serde_json::from_str(&captured[1].body).unwrap();
    let messages = second["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert!(messages[0]["content"]
        .as_str()
        .unwrap()
        .contains("Title: Petstore"));
    assert_eq!(messages[2]["content"], "Use a bearer token.");
    assert_eq!(messages[3]["content"], "Where does it go?");
    assert_eq!(second["max_tokens"], 1000);
}
