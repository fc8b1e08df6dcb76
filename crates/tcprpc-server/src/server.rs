use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tcprpc_common::protocol::error::{Result, RpcError};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::connection::{handle_connection, ConnectionContext};
use crate::registry::MethodRegistry;

/// Pause after a failed `accept` so a persistent failure (e.g. EMFILE) does not spin.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Async TCP server for tcprpc.
///
/// Accepts connections in a loop and serves each on its own tokio task, so a
/// slow or stalled connection never holds up `accept` or other connections.
///
/// # Example
///
/// ```no_run
/// use tcprpc_server::{MethodRegistry, RpcServer, ServerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::new().with_bind_addr("127.0.0.1:5000").with_at_most_once(true);
/// let server = RpcServer::bind(config, MethodRegistry::with_builtins()).await?;
/// server.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct RpcServer {
    listener: TcpListener,
    context: Arc<ConnectionContext>,
}

impl RpcServer {
    /// Validates `config` and binds the listener.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a bad configuration and `Connection` if the
    /// address cannot be bound.
    pub async fn bind(config: ServerConfig, registry: MethodRegistry) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.bind_addr).await.map_err(|e| {
            RpcError::Connection(format!("Failed to bind to {}: {}", config.bind_addr, e))
        })?;

        let context = Arc::new(ConnectionContext::new(Arc::new(registry), &config));

        tracing::info!(
            addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_else(|_| config.bind_addr.clone()),
            methods = ?context.registry().names(),
            "RPC server listening"
        );
        tracing::info!(
            "Options: delay_seconds={:.2} drop_rate={:.2} at_most_once={}",
            config.delay.as_secs_f64(),
            config.drop_rate,
            config.at_most_once
        );

        Ok(Self { listener, context })
    }

    /// Gets the actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| RpcError::Connection(format!("Failed to get local addr: {}", e)))
    }

    /// Serves connections forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves connections until `shutdown` resolves.
    ///
    /// Stops accepting once `shutdown` completes; connections already being
    /// served keep running on their own tasks. A failed `accept` is logged and,
    /// after `ACCEPT_ERROR_BACKOFF`, the loop carries on.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(
                        cached_responses = self.context.cache().len(),
                        "Shutting down RPC server"
                    );
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            accept_error_backoff(&e).await;
                            continue;
                        }
                    };

                    let context = Arc::clone(&self.context);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, peer, context).await {
                            tracing::debug!(%peer, "Connection closed with error: {}", e);
                        }
                    });
                }
            }
        }
    }
}

async fn accept_error_backoff(err: &std::io::Error) {
    tracing::warn!("Failed to accept connection: {}", err);
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}
