mod common;

use common::{closed_port_url, MockBackend, Received};
use cx_query::api_client::ApiClient;
use cx_query::config::config::IconConfig;
use cx_query::display::Renderer;
use cx_query::models::{
    Confidence, HealthStatus, QueryMode, QueryOutcome, QueryRequest, QuerySubtype,
};
use cx_query::query_client::QueryClient;
use serde_json::json;
use std::time::Duration;

const REFUND_ANSWER: &str = r#"{"answer":"Issue refund within 5 business days","confidence":"HIGH","citations":[{"policyName":"Refund Policy","sectionTitle":"Section 3.2"}]}"#;

fn client_for(backend: &MockBackend) -> QueryClient {
    QueryClient::new(ApiClient::new(&backend.base_url))
}

#[tokio::test]
async fn test_refund_dispute_end_to_end() {
    let backend = MockBackend::start().await;
    backend.reply_with(200, REFUND_ANSWER);
    let mut client = client_for(&backend);

    let outcome = client
        .submit_query(QueryRequest::general(
            "How do I handle a refund dispute?",
            QuerySubtype::Policy,
        ))
        .await;

    assert_eq!(
        backend.received(),
        vec![Received {
            path: "/api/cx/answer".to_string(),
            body: json!({"query": "How do I handle a refund dispute?", "type": "policy"}),
        }]
    );

    let QueryOutcome::Success(result) = &outcome else {
        panic!("expected success, got {:?}", outcome);
    };
    assert_eq!(result.answer, "Issue refund within 5 business days");
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.citations.len(), 1);
    assert!(result.risks.is_empty());

    let rendered = Renderer::new(IconConfig::simple()).render_outcome(&outcome);
    assert!(rendered.contains("Issue refund within 5 business days"));
    assert!(rendered.contains("Confidence: HIGH"));
    assert!(rendered.contains("Refund Policy"));

    assert_eq!(client.history().len(), 1);
    let entry = client.history().latest().unwrap();
    assert_eq!(entry.query, "How do I handle a refund dispute?");
    assert_eq!(entry.mode, QueryMode::General);
    assert_eq!(entry.result, *result);
}

#[tokio::test]
async fn test_each_mode_hits_its_route() {
    let backend = MockBackend::start().await;
    let mut client = client_for(&backend);

    for subtype in QuerySubtype::ALL {
        client
            .submit_query(QueryRequest::general("Where is my order?", subtype))
            .await;
    }
    client
        .submit_query(QueryRequest::new(
            "Customer wants a refund after 40 days",
            QueryMode::Policy,
            QuerySubtype::Complaint,
        ))
        .await;
    client
        .submit_query(QueryRequest::new(
            "Agent hung up on me",
            QueryMode::Complaint,
            QuerySubtype::Policy,
        ))
        .await;

    let received = backend.received();
    assert_eq!(received.len(), 5);
    assert_eq!(received[0].body, json!({"query": "Where is my order?", "type": "both"}));
    assert_eq!(received[1].body, json!({"query": "Where is my order?", "type": "policy"}));
    assert_eq!(received[2].body, json!({"query": "Where is my order?", "type": "complaint"}));
    assert_eq!(received[3].path, "/api/cx/policy-guidance");
    assert_eq!(
        received[3].body,
        json!({"scenario": "Customer wants a refund after 40 days"})
    );
    assert_eq!(received[4].path, "/api/cx/complaint-analysis");
    assert_eq!(received[4].body, json!({"complaint": "Agent hung up on me"}));
}

#[tokio::test]
async fn test_missing_fields_take_defaults() {
    let backend = MockBackend::start().await;
    backend.reply_with(200, "{}");
    let mut client = client_for(&backend);

    let outcome = client
        .submit_query(QueryRequest::general("anything", QuerySubtype::Both))
        .await;

    let QueryOutcome::Success(result) = outcome else {
        panic!("expected success");
    };
    assert_eq!(result.answer, "No answer");
    assert_eq!(result.confidence, Confidence::Unknown);
    assert!(result.citations.is_empty());
    assert!(result.risks.is_empty());
    assert_eq!(result.next_action, None);
}

#[tokio::test]
async fn test_backend_error_surfaces_body_and_keeps_history() {
    let backend = MockBackend::start().await;
    backend.reply_with(200, REFUND_ANSWER);
    let mut client = client_for(&backend);
    client
        .submit_query(QueryRequest::general("first", QuerySubtype::Both))
        .await;

    backend.reply_with(500, "internal error");
    let outcome = client
        .submit_query(QueryRequest::general("second", QuerySubtype::Both))
        .await;

    assert_eq!(outcome, QueryOutcome::BackendError("internal error".to_string()));
    assert_eq!(client.history().len(), 1);
    assert_eq!(client.history().latest().unwrap().query, "first");

    let rendered = Renderer::new(IconConfig::simple()).render_outcome(&outcome);
    assert!(rendered.contains("Error: internal error"));
}

#[tokio::test]
async fn test_non_200_success_status_is_backend_error() {
    let backend = MockBackend::start().await;
    backend.reply_with(202, "accepted, try later");
    let mut client = client_for(&backend);

    let outcome = client
        .submit_query(QueryRequest::general("queued?", QuerySubtype::Both))
        .await;

    assert_eq!(
        outcome,
        QueryOutcome::BackendError("accepted, try later".to_string())
    );
    assert!(client.history().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let backend = MockBackend::start().await;
    backend.reply_with(200, "<html>gateway</html>");
    let mut client = client_for(&backend);

    let outcome = client
        .submit_query(QueryRequest::general("hello", QuerySubtype::Both))
        .await;

    assert!(matches!(outcome, QueryOutcome::TransportError(_)));
    assert!(client.history().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let mut client = QueryClient::new(ApiClient::new(&closed_port_url().await));

    let outcome = client
        .submit_query(QueryRequest::general("hello", QuerySubtype::Both))
        .await;

    let QueryOutcome::TransportError(message) = outcome else {
        panic!("expected transport error");
    };
    assert!(!message.is_empty());
    assert!(client.history().is_empty());
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let backend = MockBackend::start().await;
    backend.delay_answers(Duration::from_secs(3));
    let mut client = QueryClient::new(
        ApiClient::new(&backend.base_url)
            .with_timeouts(Duration::from_millis(300), Duration::from_secs(10)),
    );

    let outcome = client
        .submit_query(QueryRequest::general("slow", QuerySubtype::Both))
        .await;

    let QueryOutcome::TransportError(message) = outcome else {
        panic!("expected transport error");
    };
    assert!(message.contains("timed out"), "{}", message);
    assert!(client.history().is_empty());
}

#[tokio::test]
async fn test_empty_query_sends_nothing() {
    let backend = MockBackend::start().await;
    let mut client = client_for(&backend);

    let outcome = client
        .submit_query(QueryRequest::general("", QuerySubtype::Both))
        .await;

    assert_eq!(outcome, QueryOutcome::Skipped);
    assert!(backend.received().is_empty());
    assert!(client.history().is_empty());
}

#[tokio::test]
async fn test_history_keeps_five_most_recent() {
    let backend = MockBackend::start().await;
    let mut client = client_for(&backend);

    for i in 1..=6 {
        let outcome = client
            .submit_query(QueryRequest::general(format!("question {}", i), QuerySubtype::Both))
            .await;
        assert!(outcome.is_success());
    }

    let queries: Vec<String> = client
        .history()
        .entries()
        .map(|entry| entry.query.clone())
        .collect();
    assert_eq!(
        queries,
        vec!["question 6", "question 5", "question 4", "question 3", "question 2"]
    );

    client.clear_history();
    assert_eq!(client.history().entries().count(), 0);
    assert_eq!(backend.received().len(), 6);
}

#[tokio::test]
async fn test_health_statuses() {
    let backend = MockBackend::start().await;
    let mut client = client_for(&backend);
    client
        .submit_query(QueryRequest::general("seed", QuerySubtype::Both))
        .await;

    assert_eq!(client.check_health().await, HealthStatus::Online);

    backend.health_returns(503);
    assert_eq!(client.check_health().await, HealthStatus::Offline(503));
    assert_eq!(client.history().len(), 1);

    let offline = QueryClient::new(ApiClient::new(&closed_port_url().await));
    assert!(matches!(
        offline.check_health().await,
        HealthStatus::Unreachable(_)
    ));
    assert!(offline.history().is_empty());
}
