//! Server configuration.
//!
//! Deployment-time switches for the server: where to bind, the artificial
//! delay and drop-rate test hooks, the at-most-once response cache, and the
//! largest request frame the server will accept.

use std::time::Duration;

use tcprpc_common::protocol::{Result, RpcError};
use tcprpc_common::transport::DEFAULT_MAX_FRAME_SIZE;

/// Default bind address (all interfaces, port 5000).
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Server configuration.
///
/// # Fields
///
/// - `bind_addr` - Address the listener binds to (default: `0.0.0.0:5000`)
/// - `delay` - Sleep applied before dispatching each uncached request (default: none)
/// - `drop_rate` - Probability in `[0, 1]` of silently withholding a response (default: 0)
/// - `at_most_once` - Whether responses are cached by request id (default: off)
/// - `max_frame_size` - Largest accepted request payload in bytes (default: 16 MiB)
///
/// # Example
///
/// ```
/// use tcprpc_server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new()
///     .with_bind_addr("127.0.0.1:0")
///     .with_delay(Duration::from_millis(500))
///     .with_drop_rate(0.25)
///     .with_at_most_once(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub delay: Duration,
    pub drop_rate: f64,
    pub at_most_once: bool,
    pub max_frame_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            delay: Duration::ZERO,
            drop_rate: 0.0,
            at_most_once: false,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_addr(mut self, bind_addr: impl Into<String>) -> Self {
        self.bind_addr = bind_addr.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_drop_rate(mut self, drop_rate: f64) -> Self {
        self.drop_rate = drop_rate;
        self
    }

    pub fn with_at_most_once(mut self, enabled: bool) -> Self {
        self.at_most_once = enabled;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if:
    /// - The bind address is empty
    /// - The drop rate is not a number in `[0, 1]`
    /// - The maximum frame size is zero
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(RpcError::InvalidConfig("bind address must not be empty".to_string()));
        }

        if !(0.0..=1.0).contains(&self.drop_rate) {
            return Err(RpcError::InvalidConfig(format!(
                "drop rate must be within [0, 1] (got {})",
                self.drop_rate
            )));
        }

        if self.max_frame_size == 0 {
            return Err(RpcError::InvalidConfig(
                "max frame size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
