// Integration tests for tcprpc-server
//
// These tests start a real server on a loopback port and talk to it with raw
// frames over TCP.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tcprpc_common::protocol::error::Result as RpcResult;
use tcprpc_common::protocol::{Request, Response, RpcError, Status};
use tcprpc_common::transport::{JsonCodec, TcpTransportAsync};
use tcprpc_server::{ExecutionError, MethodRegistry, RpcServer, ServerConfig};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

// ============================================================================
// Test Helpers
// ============================================================================

/// Frame-level client holding one connection open
struct TestClient {
    stream: TcpStream,
    transport: TcpTransportAsync,
}

impl TestClient {
    async fn connect(addr: &str) -> Self {
        let transport = TcpTransportAsync::new().with_timeout(Duration::from_secs(2));
        let stream = transport.connect(addr).await.expect("Failed to connect");
        Self { stream, transport }
    }

    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport = TcpTransportAsync::new().with_timeout(timeout);
        self
    }

    /// Send a request and return the raw response payload
    async fn call_raw(&mut self, request: &Request) -> RpcResult<Vec<u8>> {
        let encoded = JsonCodec::encode_request(request)?;
        self.transport.send_message(&mut self.stream, &encoded).await?;
        self.transport.receive_message(&mut self.stream).await
    }

    async fn call(&mut self, request: &Request) -> RpcResult<Response> {
        let payload = self.call_raw(request).await?;
        JsonCodec::decode_response(&payload)
    }
}

/// Start a server on an ephemeral port in a background task
async fn start_test_server(config: ServerConfig, registry: MethodRegistry) -> (JoinHandle<()>, String) {
    let server = RpcServer::bind(config.with_bind_addr("127.0.0.1:0"), registry)
        .await
        .expect("Failed to bind server");
    let addr = server.local_addr().expect("Failed to get local address").to_string();

    let handle = tokio::spawn(async move {
        let _ = server.run().await;
    });

    (handle, addr)
}

/// Builtins plus a `count` method reporting how often it has run
fn counting_registry() -> (MethodRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut registry = MethodRegistry::with_builtins();
    registry.register("count", move |_: Value| {
        Ok::<_, ExecutionError>(counter.fetch_add(1, Ordering::SeqCst) + 1)
    });
    (registry, calls)
}

// ============================================================================
// Builtin Method Scenarios
// ============================================================================

#[tokio::test]
async fn test_add_scenario() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    let request = Request::from_value("add", json!({"a": 2, "b": 3}));
    let response = client.call(&request).await.unwrap();

    assert_eq!(response.request_id, request.request_id);
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.result, Some(json!(5)));
}

#[tokio::test]
async fn test_reverse_string_scenario() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    let request = Request::from_value("reverse_string", json!({"s": "abc"}));
    let response = client.call(&request).await.unwrap();

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.result, Some(json!("cba")));
}

#[tokio::test]
async fn test_unknown_method_scenario() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    let request = Request::from_value("foo", json!({}));
    let response = client.call(&request).await.unwrap();

    assert_eq!(response.request_id, request.request_id);
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.error.as_deref(), Some("Unknown method: foo"));
    assert!(response.result.is_none());
}

#[tokio::test]
async fn test_get_time_scenario() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    let response = client.call(&Request::from_value("get_time", json!({}))).await.unwrap();

    assert_eq!(response.status, Status::Ok);
    let stamp = response.result.unwrap();
    let parsed = time::OffsetDateTime::parse(
        stamp.as_str().unwrap(),
        &time::format_description::well_known::Rfc3339,
    );
    assert!(parsed.is_ok(), "not an ISO-8601 timestamp: {}", stamp);
}

// ============================================================================
// Connection Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_connection_survives_execution_error() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    let bad = client.call(&Request::from_value("add", json!({"a": 1}))).await.unwrap();
    assert!(bad.error.unwrap().starts_with("Execution error: InvalidParams:"));

    let good = client.call(&Request::from_value("add", json!({"a": 1, "b": 1}))).await.unwrap();
    assert_eq!(good.result, Some(json!(2)));
}

#[tokio::test]
async fn test_malformed_payload_closes_connection() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    client.transport.send_message(&mut client.stream, b"this is not json").await.unwrap();
    let next = client.transport.try_receive_message(&mut client.stream).await;

    assert!(!matches!(next, Ok(Some(_))), "server answered a malformed frame");
}

#[tokio::test]
async fn test_malformed_payload_does_not_affect_other_connections() {
    let (_handle, addr) = start_test_server(ServerConfig::new(), MethodRegistry::with_builtins()).await;
    let mut broken = TestClient::connect(&addr).await;
    let mut healthy = TestClient::connect(&addr).await;

    broken.transport.send_message(&mut broken.stream, b"\xff\xfe").await.unwrap();

    let response = healthy
        .call(&Request::from_value("reverse_string", json!({"s": "xy"})))
        .await
        .unwrap();
    assert_eq!(response.result, Some(json!("yx")));
}

#[tokio::test]
async fn test_stalled_connection_does_not_block_others() {
    let config = ServerConfig::new().with_delay(Duration::from_millis(300));
    let (_handle, addr) = start_test_server(config, MethodRegistry::with_builtins()).await;

    // First connection sends a request that sits in the artificial delay
    let mut slow = TestClient::connect(&addr).await;
    let slow_request = Request::from_value("add", json!({"a": 1, "b": 1}));
    let encoded = JsonCodec::encode_request(&slow_request).unwrap();
    slow.transport.send_message(&mut slow.stream, &encoded).await.unwrap();

    // An idle connection that never sends anything
    let _idle = TestClient::connect(&addr).await;

    let start = Instant::now();
    let mut fast = TestClient::connect(&addr).await;
    let response = fast.call(&Request::from_value("add", json!({"a": 2, "b": 2}))).await.unwrap();

    assert_eq!(response.result, Some(json!(4)));
    assert!(start.elapsed() < Duration::from_millis(550), "requests were serialized");
}

// ============================================================================
// At-Most-Once Tests
// ============================================================================

#[tokio::test]
async fn test_at_most_once_returns_identical_bytes() {
    let (registry, calls) = counting_registry();
    let (_handle, addr) = start_test_server(ServerConfig::new().with_at_most_once(true), registry).await;

    let request = Request::from_value("count", json!({}));

    let mut first_conn = TestClient::connect(&addr).await;
    let first = first_conn.call_raw(&request).await.unwrap();

    let mut second_conn = TestClient::connect(&addr).await;
    let second = second_conn.call_raw(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_at_least_once_without_cache() {
    let (registry, calls) = counting_registry();
    let (_handle, addr) = start_test_server(ServerConfig::new(), registry).await;

    let request = Request::from_value("count", json!({}));
    let mut client = TestClient::connect(&addr).await;

    let first = client.call(&request).await.unwrap();
    let second = client.call(&request).await.unwrap();

    assert_eq!(first.result, Some(json!(1)));
    assert_eq!(second.result, Some(json!(2)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_hit_skips_artificial_delay() {
    let config = ServerConfig::new()
        .with_at_most_once(true)
        .with_delay(Duration::from_millis(300));
    let (_handle, addr) = start_test_server(config, MethodRegistry::with_builtins()).await;

    let request = Request::from_value("add", json!({"a": 2, "b": 3}));
    let mut client = TestClient::connect(&addr).await;

    let start = Instant::now();
    client.call(&request).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(300));

    let start = Instant::now();
    let cached = client.call(&request).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(250));
    assert_eq!(cached.result, Some(json!(5)));
}

#[tokio::test]
async fn test_unknown_method_error_is_remembered() {
    let (_handle, addr) =
        start_test_server(ServerConfig::new().with_at_most_once(true), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await;

    let request = Request::from_value("foo", json!({}));
    let first = client.call(&request).await.unwrap();
    let second = client.call(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.error.as_deref(), Some("Unknown method: foo"));
}

// ============================================================================
// Fault Injection Tests
// ============================================================================

#[tokio::test]
async fn test_drop_rate_one_withholds_response() {
    let (registry, calls) = counting_registry();
    let (_handle, addr) = start_test_server(ServerConfig::new().with_drop_rate(1.0), registry).await;

    let mut client = TestClient::connect(&addr).await.with_timeout(Duration::from_millis(200));
    let result = client.call(&Request::from_value("count", json!({}))).await;

    assert!(matches!(result, Err(RpcError::Timeout(200))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_connection_keeps_serving_after_drop() {
    let (_handle, addr) = start_test_server(ServerConfig::new().with_drop_rate(1.0), MethodRegistry::with_builtins()).await;
    let mut client = TestClient::connect(&addr).await.with_timeout(Duration::from_millis(100));

    let first = client.call(&Request::from_value("add", json!({"a": 1, "b": 1}))).await;
    assert!(matches!(first, Err(RpcError::Timeout(_))));

    // The server read the second frame too, it just dropped it: still a timeout, not a reset
    let second = client.call(&Request::from_value("add", json!({"a": 1, "b": 1}))).await;
    assert!(matches!(second, Err(RpcError::Timeout(_))));
}
