use std::time::Duration;

use tcprpc_common::protocol::error::{Result, RpcError};
use tcprpc_common::transport::{DEFAULT_MAX_FRAME_SIZE, DEFAULT_TIMEOUT};

/// Pause between two attempts of the same logical call.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

pub const DEFAULT_RETRIES: u32 = 2;

/// Client configuration.
///
/// # Default Configuration
///
/// - `timeout`: 2 seconds, applied separately to connect, send and receive
/// - `retries`: 2, so a call makes at most 3 attempts
/// - `backoff`: 200 milliseconds
/// - `max_frame_size`: 16 MiB
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tcprpc_client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(Duration::from_millis(500))
///     .with_retries(4);
/// assert_eq!(config.max_attempts(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub retries: u32,
    pub backoff: Duration,
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// Total number of attempts a call may make.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(RpcError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_frame_size == 0 {
            return Err(RpcError::InvalidConfig(
                "max_frame_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
