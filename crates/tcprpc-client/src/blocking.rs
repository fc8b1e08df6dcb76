use tcprpc_common::protocol::error::Result;
use tcprpc_common::protocol::{Params, Request, Response};
use tcprpc_common::transport::TcpTransport;

use crate::config::ClientConfig;
use crate::retry::CallTracker;

/// Blocking counterpart of [`RpcClient`](crate::RpcClient).
///
/// Same attempt and retry behavior, on std sockets with socket-level timeouts
/// and `std::thread::sleep` between attempts. Usable without a tokio runtime.
#[derive(Debug, Clone)]
pub struct BlockingRpcClient {
    addr: String,
    config: ClientConfig,
    transport: TcpTransport,
}

impl BlockingRpcClient {
    pub fn new(addr: impl Into<String>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport =
            TcpTransport::new(config.timeout).with_max_frame_size(config.max_frame_size);

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

    pub fn call(&self, method: impl Into<String>, params: Params) -> Response {
        self.send(Request::new(method, params))
    }

    pub fn send(&self, request: Request) -> Response {
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

            match self.attempt(&request).and_then(|r| tracker.correlate(r)) {
                Ok(response) => return response,
                Err(e) => {
                    let note = tracker.record_failure(&e);
                    tracing::warn!(request_id = %request.request_id, "{}", note);
                }
            }

            if !tracker.should_retry() {
                break;
            }
            std::thread::sleep(self.config.backoff);
        }

        tracker.exhausted()
    }

    fn attempt(&self, request: &Request) -> Result<Response> {
        let mut stream = self.transport.connect(&self.addr)?;
        self.transport.send_request(&mut stream, request)
    }
}
