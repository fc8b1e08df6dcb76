//! Per-connection request loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tcprpc_common::protocol::error::Result;
use tcprpc_common::protocol::{Request, Response};
use tcprpc_common::transport::{JsonCodec, TcpTransportAsync};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::cache::ResponseCache;
use crate::config::ServerConfig;
use crate::faults::FaultInjector;
use crate::registry::MethodRegistry;

/// State shared by every connection handled by one server.
///
/// The registry is read-only; the cache is the only mutable shared state.
#[derive(Debug)]
pub struct ConnectionContext {
    registry: Arc<MethodRegistry>,
    cache: ResponseCache,
    faults: FaultInjector,
    transport: TcpTransportAsync,
}

impl ConnectionContext {
    pub fn new(registry: Arc<MethodRegistry>, config: &ServerConfig) -> Self {
        Self {
            registry,
            cache: ResponseCache::new(config.at_most_once),
            faults: FaultInjector::new(config.delay, config.drop_rate),
            transport: TcpTransportAsync::new().with_max_frame_size(config.max_frame_size),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Produces the response for one request, or `None` if it is to be dropped.
    ///
    /// A cache hit skips the delay, the drop check and dispatch.
    pub async fn process(&self, request: &Request, peer: SocketAddr) -> Option<Response> {
        if let Some(cached) = self.cache.get(&request.request_id) {
            tracing::info!(%peer, request_id = %request.request_id, "CACHE HIT");
            return Some(cached);
        }

        self.faults.apply_delay().await;

        if self.faults.should_drop() {
            tracing::warn!(
                %peer,
                request_id = %request.request_id,
                "Dropping response intentionally (drop_rate={:.2})",
                self.faults.drop_rate()
            );
            return None;
        }

        let response = self.registry.dispatch(request);
        self.cache.put(request.request_id.clone(), response.clone());
        Some(response)
    }
}

/// Serves one connection until the peer disconnects or a frame cannot be read.
///
/// Processes requests sequentially: one frame in, at most one frame out.
/// Execution faults come back as `ERROR` responses and the loop continues;
/// a decode failure or I/O error ends the connection.
pub async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    ctx: Arc<ConnectionContext>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::info!(%peer, "Client connected");

    loop {
        let payload = match ctx.transport.try_receive_message(&mut stream).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::info!(%peer, "Client disconnected");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(%peer, kind = e.kind(), "Connection terminated: {}", e);
                return Err(e);
            }
        };

        let request = match JsonCodec::decode_request(&payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(%peer, kind = e.kind(), "Failed to decode request: {}", e);
                return Err(e);
            }
        };

        tracing::info!(
            %peer,
            request_id = %request.request_id,
            method = %request.method,
            params = ?request.params,
            "REQ"
        );

        let Some(response) = ctx.process(&request, peer).await else {
            continue;
        };

        let encoded = JsonCodec::encode_response(&response)?;
        if let Err(e) = ctx.transport.send_message(&mut stream, &encoded).await {
            tracing::warn!(
                %peer,
                request_id = %request.request_id,
                method = %request.method,
                "Failed to send response: {}",
                e
            );
            return Err(e);
        }
    }
}
