use tcprpc_common::protocol::error::Result;
use tcprpc_common::protocol::{Params, Request, Response};
use tcprpc_common::transport::TcpTransportAsync;

use crate::config::ClientConfig;
use crate::retry::CallTracker;

/// tcprpc client for making RPC calls
///
/// Opens a fresh TCP connection for every attempt. Connect, send and receive
/// are each bounded by the configured timeout; failed attempts are retried
/// with the same request id after a constant backoff.
#[derive(Debug, Clone)]
pub struct RpcClient {
    addr: String,
    config: ClientConfig,
    transport: TcpTransportAsync,
}

impl RpcClient {
    /// Create a client for the server at `addr` (`host:port`).
    ///
    /// No connection is made until the first call.
    pub fn new(addr: impl Into<String>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = TcpTransportAsync::new()
            .with_timeout(config.timeout)
            .with_max_frame_size(config.max_frame_size);

        Ok(Self {
            addr: addr.into(),
            config,
            transport,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Call an RPC method with a freshly generated request id.
    pub async fn call(&self, method: impl Into<String>, params: Params) -> Response {
        self.send(Request::new(method, params)).await
    }

    /// Deliver a caller-built request, retrying until a matching response
    /// arrives or the attempts run out.
    ///
    /// Never fails: exhaustion is reported as an `ERROR` response carrying
    /// the request id and the last attempt's note.
    pub async fn send(&self, request: Request) -> Response {
        let mut tracker = CallTracker::new(request.request_id.clone(), self.config.max_attempts());

        loop {
            let attempt = tracker.begin_attempt();
            tracing::debug!(
                request_id = %request.request_id,
                method = %request.method,
                addr = %self.addr,
                "Attempt {}/{}",
                attempt,
                tracker.max_attempts()
            );

            match self.attempt(&request).await.and_then(|r| tracker.correlate(r)) {
                Ok(response) => return response,
                Err(e) => {
                    let note = tracker.record_failure(&e);
                    tracing::warn!(request_id = %request.request_id, "{}", note);
                }
            }

            if !tracker.should_retry() {
                break;
            }
            tokio::time::sleep(self.config.backoff).await;
        }

        tracker.exhausted()
    }

    async fn attempt(&self, request: &Request) -> Result<Response> {
        let mut stream = self.transport.connect(&self.addr).await?;
        self.transport.send_request(&mut stream, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tcprpc_common::protocol::RpcError;

    #[test]
    fn test_client_creation() {
        // Will create successfully even if no server is listening
        let client = RpcClient::new("localhost:5000", ClientConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_config() {
        let config = ClientConfig::new().with_timeout(Duration::ZERO);
        let client = RpcClient::new("localhost:5000", config);
        assert!(matches!(client, Err(RpcError::InvalidConfig(_))));
    }

    #[test]
    fn test_client_is_clonable() {
        let client = RpcClient::new("localhost:5000", ClientConfig::default()).unwrap();
        let client2 = client.clone();
        assert_eq!(client.addr(), client2.addr());
        assert_eq!(client.config(), client2.config());
    }
}
