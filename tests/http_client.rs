//! Request/retry behavior of `RequestClient` against a mock HTTP server.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use covenant_client::{
    ClientConfig, ConnectionStatus, Empty, MemoryTokenStore, RequestClient, RequestConfig,
};

fn test_config(base: &str) -> ClientConfig {
    ClientConfig {
        api_base_url: base.to_string(),
        retry_base_delay_ms: 20,
        max_retries: 3,
        ..ClientConfig::default()
    }
}

fn client_for(server: &MockServer) -> (RequestClient, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let dyn_tokens: Arc<dyn covenant_client::TokenStore> = Arc::clone(&tokens) as _;
    let client = RequestClient::new(test_config(&server.uri()), dyn_tokens);
    (client, tokens)
}

/// Matches requests carrying no Authorization header at all.
struct NoAuthHeader;

impl wiremock::Match for NoAuthHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

#[tokio::test]
async fn client_errors_reject_after_exactly_one_attempt() {
    for status in [400u16, 401, 403, 404, 422] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contracts"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "message": "rejected"
            })))
            .expect(1)
            .mount(&server)
            .await;

        // a long base delay makes any accidental backoff sleep visible
        let config = ClientConfig {
            retry_base_delay_ms: 500,
            ..test_config(&server.uri())
        };
        let client = RequestClient::new(config, Arc::new(MemoryTokenStore::new()));

        let started = Instant::now();
        let error = client
            .get::<Value>("/contracts")
            .await
            .expect_err("non-2xx must reject");

        assert_eq!(error.status, status);
        assert_eq!(error.message, "rejected");
        assert!(started.elapsed() < Duration::from_millis(450));
    }
}

#[tokio::test]
async fn persistent_server_errors_exhaust_all_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "overloaded"
        })))
        .expect(4) // initial attempt + max_retries
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let started = Instant::now();
    let error = client
        .get::<Value>("/contracts")
        .await
        .expect_err("persistent 503 must reject");

    assert_eq!(error.status, 503);
    assert_eq!(error.message, "overloaded");
    // backoff slept at least 20 + 40 + 80 ms between the four attempts
    assert!(started.elapsed() >= Duration::from_millis(140));
    assert_eq!(client.connection_status(), ConnectionStatus::Error);
}

#[tokio::test]
async fn transient_failure_recovers_on_the_next_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts/c-1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contracts/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c-1",
            "status": "analyzed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let contract: Value = client.get("/contracts/c-1").await.expect("second attempt succeeds");

    assert_eq!(contract["status"], "analyzed");
    assert_eq!(client.connection_status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn no_content_resolves_to_an_empty_value() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/contracts/c-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let outcome: Empty = client.delete("/contracts/c-9").await.expect("204 is a success");
    assert_eq!(outcome, Empty::default());
}

#[tokio::test]
async fn missing_token_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .and(NoAuthHeader)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _tokens) = client_for(&server);
    let contracts: Value = client.get("/contracts").await.expect("unauthenticated calls proceed");
    assert_eq!(contracts, json!([]));
}

#[tokio::test]
async fn stored_token_is_attached_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server);
    tokens.set("covenant.auth_token", "tok-123");

    client.get::<Value>("/contracts").await.expect("authenticated call");
}

#[tokio::test]
async fn legacy_storage_key_is_used_as_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .and(header("authorization", "Bearer pre-migration-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, tokens) = client_for(&server);
    tokens.set("auth_token", "pre-migration-tok");

    client.get::<Value>("/contracts").await.expect("legacy token accepted");
}

#[tokio::test]
async fn query_parameters_are_stringified_and_appended() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts/search"))
        .and(query_param("q", "indemnity"))
        .and(query_param("page", "2"))
        .and(query_param("archived", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let config = RequestConfig::get()
        .with_query("q", "indemnity")
        .with_query("page", 2)
        .with_query("archived", false);

    client
        .request::<Value>("/contracts/search", config)
        .await
        .expect("query parameters match");
}

#[tokio::test]
async fn post_sends_json_body_and_header_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/contracts"))
        .and(header("x-request-id", "rid-7"))
        .and(body_json(json!({"title": "Mutual NDA"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let config = RequestConfig::post()
        .with_body(json!({"title": "Mutual NDA"}))
        .with_header("X-Request-Id", "rid-7");

    let created: Value = client.request("/contracts", config).await.expect("created");
    assert_eq!(created["id"], "c-2");
}

#[tokio::test]
async fn malformed_success_body_fails_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contracts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    let error = client
        .get::<Value>("/contracts")
        .await
        .expect_err("unparsable body is a failure");

    assert_eq!(error.status, 200);
    assert!(error.message.contains("decode"));
}

#[tokio::test]
async fn network_failure_surfaces_transport_status_after_retries() {
    // nothing is listening on this port
    let config = ClientConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        retry_base_delay_ms: 5,
        max_retries: 1,
        ..ClientConfig::default()
    };
    let client = RequestClient::new(config, Arc::new(MemoryTokenStore::new()));

    let error = client
        .get::<Value>("/contracts")
        .await
        .expect_err("unreachable host must reject");

    assert_eq!(error.status, 0);
    assert_eq!(client.connection_status(), ConnectionStatus::Error);
}
